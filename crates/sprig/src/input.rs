//! Keyboard and mouse input state.
//!
//! The [`Input`] tracker records which keys/buttons are currently pressed,
//! just pressed this frame, or just released this frame. It is fed from
//! [`Event`](crate::event::Event)s, so the platform layer only has to
//! translate its native codes into [`KeyCode`] and [`MouseButton`].

use std::collections::HashSet;
use std::hash::Hash;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Call once at the end of each frame.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine key codes. The platform layer maps its scancodes onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    Escape,
    Enter,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    A,
    D,
    E,
    Q,
    S,
    W,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    LeftShift,
    LeftControl,
    LeftAlt,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Mouse cursor position in window coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorPosition {
    pub x: f32,
    pub y: f32,
}
