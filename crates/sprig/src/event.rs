//! # Events — One Closed Set of Window and Input Events
//!
//! Every event the platform layer can deliver is a variant of [`EventKind`].
//! Handlers `match` on it exhaustively; there is no downcasting and no
//! registry of event types.
//!
//! ```text
//! platform ──► Event { kind, handled: false }
//!                 │
//!                 ▼
//!   LayerStack (top overlay first) ── layer marks handled ──► stop
//!                 │
//!                 ▼
//!            Scene::on_event (input tracking, viewport resize)
//! ```
//!
//! The `handled` flag is the only cross-handler protocol: once set, the
//! [`LayerStack`](crate::layer::LayerStack) stops propagating.

use std::fmt;

use crate::input::{KeyCode, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    KeyPressed { key: KeyCode, repeat_count: u32 },
    KeyReleased { key: KeyCode },
    KeyTyped { character: char },
    MouseMoved { x: f32, y: f32 },
    MouseScrolled { x_offset: f32, y_offset: f32 },
    MouseButtonPressed { button: MouseButton },
    MouseButtonReleased { button: MouseButton },
    WindowResized { width: u32, height: u32 },
    WindowClosed,
}

/// Coarse grouping, handy for filtering in layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Keyboard,
    Mouse,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    kind: EventKind,
    handled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            handled: false,
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    /// Run `handler` on the event kind and record its verdict as the handled
    /// flag, unless the event is already handled.
    ///
    /// ```ignore
    /// event.dispatch(|kind| matches!(kind, EventKind::WindowClosed));
    /// ```
    pub fn dispatch(&mut self, handler: impl FnOnce(&EventKind) -> bool) {
        if !self.handled {
            self.handled = handler(&self.kind);
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            EventKind::KeyPressed { .. } => "KeyPressed",
            EventKind::KeyReleased { .. } => "KeyReleased",
            EventKind::KeyTyped { .. } => "KeyTyped",
            EventKind::MouseMoved { .. } => "MouseMoved",
            EventKind::MouseScrolled { .. } => "MouseScrolled",
            EventKind::MouseButtonPressed { .. } => "MouseButtonPressed",
            EventKind::MouseButtonReleased { .. } => "MouseButtonReleased",
            EventKind::WindowResized { .. } => "WindowResized",
            EventKind::WindowClosed => "WindowClosed",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self.kind {
            EventKind::KeyPressed { .. }
            | EventKind::KeyReleased { .. }
            | EventKind::KeyTyped { .. } => EventCategory::Keyboard,
            EventKind::MouseMoved { .. }
            | EventKind::MouseScrolled { .. }
            | EventKind::MouseButtonPressed { .. }
            | EventKind::MouseButtonReleased { .. } => EventCategory::Mouse,
            EventKind::WindowResized { .. } | EventKind::WindowClosed => EventCategory::Window,
        }
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::KeyPressed { key, repeat_count } => {
                write!(f, "KeyPressed: {key:?} ({repeat_count} repeats)")
            }
            EventKind::KeyReleased { key } => write!(f, "KeyReleased: {key:?}"),
            EventKind::KeyTyped { character } => write!(f, "KeyTyped: {character:?}"),
            EventKind::MouseMoved { x, y } => write!(f, "MouseMoved: {x}, {y}"),
            EventKind::MouseScrolled { x_offset, y_offset } => {
                write!(f, "MouseScrolled: {x_offset}, {y_offset}")
            }
            EventKind::MouseButtonPressed { button } => {
                write!(f, "MouseButtonPressed: {button:?}")
            }
            EventKind::MouseButtonReleased { button } => {
                write!(f, "MouseButtonReleased: {button:?}")
            }
            EventKind::WindowResized { width, height } => {
                write!(f, "WindowResized: {width}x{height}")
            }
            EventKind::WindowClosed => write!(f, "WindowClosed"),
        }
    }
}
