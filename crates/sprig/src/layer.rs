//! # Layers — Ordered Update and Event Routing
//!
//! A [`LayerStack`] keeps regular layers below overlays:
//!
//! ```text
//! index:  0        1        2          3
//!        [game]   [hud]  | [console]  [debug]
//!         layers ────────┘ overlays ────────
//!                        ▲
//!                   overlay_start
//! ```
//!
//! Updates run bottom to top. Events travel top to bottom and stop at the
//! first layer that marks them handled, so an overlay can swallow a click
//! before the game sees it.

use crate::event::Event;

pub trait Layer {
    fn name(&self) -> &str;

    fn on_attach(&mut self) {}

    fn on_detach(&mut self) {}

    fn on_update(&mut self, _dt: f32) {}

    fn on_event(&mut self, _event: &mut Event) {}
}

/// Handle returned by the push methods, used to pop a layer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

#[derive(Default)]
pub struct LayerStack {
    layers: Vec<(LayerId, Box<dyn Layer>)>,
    overlay_start: usize,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert below every overlay and attach.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> LayerId {
        let id = self.attach(layer, self.overlay_start);
        self.overlay_start += 1;
        id
    }

    /// Insert on top of everything and attach.
    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) -> LayerId {
        self.attach(overlay, self.layers.len())
    }

    /// Detach and return a regular layer. `None` if `id` is not a layer.
    pub fn pop_layer(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let pos = self.layers[..self.overlay_start]
            .iter()
            .position(|(lid, _)| *lid == id)?;
        self.overlay_start -= 1;
        Some(self.detach(pos))
    }

    /// Detach and return an overlay. `None` if `id` is not an overlay.
    pub fn pop_overlay(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let pos = self.layers[self.overlay_start..]
            .iter()
            .position(|(lid, _)| *lid == id)?;
        Some(self.detach(self.overlay_start + pos))
    }

    pub fn on_update(&mut self, dt: f32) {
        for (_, layer) in &mut self.layers {
            layer.on_update(dt);
        }
    }

    /// Offer the event to each layer from the top until one handles it.
    pub fn on_event(&mut self, event: &mut Event) {
        for (_, layer) in self.layers.iter_mut().rev() {
            if event.handled() {
                break;
            }
            layer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names bottom to top.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(_, layer)| layer.name())
    }

    fn attach(&mut self, mut layer: Box<dyn Layer>, at: usize) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        log::debug!("attaching layer '{}'", layer.name());
        layer.on_attach();
        self.layers.insert(at, (id, layer));
        id
    }

    fn detach(&mut self, pos: usize) -> Box<dyn Layer> {
        let (_, mut layer) = self.layers.remove(pos);
        log::debug!("detaching layer '{}'", layer.name());
        layer.on_detach();
        layer
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        for (_, layer) in &mut self.layers {
            layer.on_detach();
        }
    }
}
