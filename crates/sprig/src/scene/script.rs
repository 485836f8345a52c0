//! # Native Scripts
//!
//! A [`Behavior`] is gameplay code attached to one entity through a
//! [`NativeScript`](super::components::NativeScript) component. Each frame
//! the scene hands it a [`ScriptContext`]: its own entity, component access
//! on the scene's store, and the current keyboard state.
//!
//! ```ignore
//! struct Spinner;
//!
//! impl Behavior for Spinner {
//!     fn name(&self) -> &str { "Spinner" }
//!
//!     fn on_update(&mut self, ctx: &mut ScriptContext, dt: f32) {
//!         ctx.get_mut::<Transform>().rotation.z += dt;
//!     }
//! }
//!
//! scene.store_mut().add(entity, NativeScript::new(Spinner));
//! ```
//!
//! The context deliberately has no way to create or destroy entities or to
//! add and remove components. Scripts run while the scene is iterating its
//! script list.
//!
//! ## Registry
//!
//! Saved scenes refer to scripts by name. [`ScriptRegistry`] maps a name to
//! a constructor so the serializer can rebind them on load.

use std::collections::HashMap;

use super::components::Transform;
use crate::ecs::{ComponentStore, Entity};
use crate::input::{Input, KeyCode};

pub trait Behavior: 'static {
    /// Stable name used when saving and reloading scenes.
    fn name(&self) -> &str;

    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) {}

    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) {}

    fn on_destroy(&mut self) {}
}

pub struct ScriptContext<'a> {
    entity: Entity,
    store: &'a mut ComponentStore,
    keys: &'a Input<KeyCode>,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(
        entity: Entity,
        store: &'a mut ComponentStore,
        keys: &'a Input<KeyCode>,
    ) -> Self {
        Self { entity, store, keys }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn keys(&self) -> &Input<KeyCode> {
        self.keys
    }

    /// # Panics
    ///
    /// If the entity has no `T`.
    pub fn get<T: 'static>(&self) -> &T {
        self.store.get::<T>(self.entity)
    }

    /// # Panics
    ///
    /// If the entity has no `T`.
    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        self.store.get_mut::<T>(self.entity)
    }

    pub fn try_get<T: 'static>(&self) -> Option<&T> {
        self.store.try_get::<T>(self.entity)
    }

    pub fn try_get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.store.try_get_mut::<T>(self.entity)
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.store.has::<T>(self.entity)
    }

    /// Read another entity's component.
    pub fn get_other<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.store.try_get::<T>(entity)
    }
}

type Constructor = Box<dyn Fn() -> Box<dyn Behavior>>;

/// Name → constructor table for rebinding scripts from saved scenes.
pub struct ScriptRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry that knows the built-in scripts.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(CameraController::NAME, CameraController::default);
        registry
    }

    pub fn register<B: Behavior>(
        &mut self,
        name: impl Into<String>,
        constructor: impl Fn() -> B + 'static,
    ) {
        self.constructors.insert(
            name.into(),
            Box::new(move || Box::new(constructor()) as Box<dyn Behavior>),
        );
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Behavior>> {
        self.constructors.get(name).map(|constructor| constructor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Moves its entity with the arrow keys, one axis per frame.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub speed: f32,
}

impl CameraController {
    pub const NAME: &'static str = "Camera Controller";
}

impl Default for CameraController {
    fn default() -> Self {
        Self { speed: 5.0 }
    }
}

impl Behavior for CameraController {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) {
        let step = self.speed * dt;
        let delta = {
            let keys = ctx.keys();
            if keys.pressed(KeyCode::Left) {
                (-step, 0.0)
            } else if keys.pressed(KeyCode::Right) {
                (step, 0.0)
            } else if keys.pressed(KeyCode::Down) {
                (0.0, -step)
            } else if keys.pressed(KeyCode::Up) {
                (0.0, step)
            } else {
                return;
            }
        };
        let translation = &mut ctx.get_mut::<Transform>().translation;
        translation.x += delta.0;
        translation.y += delta.1;
    }
}
