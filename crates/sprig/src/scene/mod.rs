//! # Scene — Entities, a Main Camera, and the Per-Frame Update
//!
//! A [`Scene`] owns one [`ComponentStore`] and layers scene rules over it:
//!
//! - every entity is born with a [`Transform`] and a [`Tag`]
//! - at most one entity is the *main camera*, and it must carry a [`Camera`]
//! - viewport resizes propagate to every camera without a fixed aspect ratio
//!
//! ## Frame
//!
//! ```text
//! Scene::on_update(dt, renderer)
//!   ├─ update_scripts(dt)     each NativeScript: on_create (once), on_update
//!   └─ render(renderer)
//!        ├─ no main camera? → return
//!        ├─ batch = renderer.batch(main camera VP)
//!        ├─ for (Transform, SpriteRenderer): batch.draw_transformed(...)
//!        └─ batch dropped → end() → final flush
//! ```
//!
//! ## Traversal
//!
//! [`Scene::entities`] and [`Scene::each_entity`] borrow the scene shared, so
//! the borrow checker rejects structural changes (create, destroy, add or
//! remove components) while a traversal is alive. Collect ids first when a
//! pass needs to mutate.

mod components;
mod script;
mod serializer;

pub use components::{Camera, DEFAULT_TAG, NativeScript, SpriteRenderer, Tag, Transform};
pub use script::{Behavior, CameraController, ScriptContext, ScriptRegistry};
pub use serializer::{SCENE_MAGIC, SCENE_VERSION, SceneSerializer};

use glam::Mat4;

use crate::ecs::{ComponentStore, Entity};
use crate::event::{Event, EventKind};
use crate::input::{Input, KeyCode};
use crate::render::{QuadBatchRenderer, RenderBackend};

pub struct Scene {
    name: String,
    store: ComponentStore,
    main_camera: Entity,
    viewport: (u32, u32),
    keys: Input<KeyCode>,
    script_queue: Vec<Entity>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: ComponentStore::new(),
            main_camera: Entity::NULL,
            viewport: (1, 1),
            keys: Input::new(),
            script_queue: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Create an entity with the default component set.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.store.create();
        self.store.add(entity, Transform::default());
        self.store.add(entity, Tag::new(name));
        entity
    }

    /// Create an entity with a [`Camera`] sized to the current viewport.
    pub fn create_camera(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.create_entity(name);
        let mut camera = Camera::default();
        camera
            .camera
            .set_viewport(self.viewport.0 as f32, self.viewport.1 as f32);
        self.store.add(entity, camera);
        entity
    }

    /// Destroy an entity and all its components. Clears the main camera if
    /// it was this entity.
    ///
    /// # Panics
    ///
    /// If `entity` is not alive in this scene.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if entity == self.main_camera {
            self.main_camera = Entity::NULL;
        }
        self.store.destroy(entity);
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.store.is_alive(entity)
    }

    /// Make `entity` the main camera. [`Entity::NULL`] clears it.
    ///
    /// Returns `false`, leaving the previous camera in place, when `entity`
    /// has no [`Camera`].
    pub fn set_main_camera(&mut self, entity: Entity) -> bool {
        if !entity.is_null() && !self.store.has::<Camera>(entity) {
            log::error!("{entity:?} cannot be the main camera: it has no Camera component");
            return false;
        }
        self.main_camera = entity;
        true
    }

    pub fn main_camera(&self) -> Entity {
        self.main_camera
    }

    /// Projection of the main camera times the inverse of its transform.
    pub fn main_camera_view_projection(&self) -> Option<Mat4> {
        if self.main_camera.is_null() {
            return None;
        }
        let Some(camera) = self.store.try_get::<Camera>(self.main_camera) else {
            log::error!("main camera {:?} lost its Camera component", self.main_camera);
            return None;
        };
        let view = self
            .store
            .try_get::<Transform>(self.main_camera)
            .map_or(Mat4::IDENTITY, |t| t.matrix().inverse());
        Some(*camera.camera.projection() * view)
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn on_viewport_resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.store.for_each_mut::<Camera>(|_, camera| {
            if !camera.fixed_aspect_ratio {
                camera.camera.set_viewport(width as f32, height as f32);
            }
        });
    }

    /// Run scripts, then draw every sprite through the main camera.
    pub fn on_update<B: RenderBackend>(&mut self, dt: f32, renderer: &mut QuadBatchRenderer<B>) {
        self.update_scripts(dt);
        self.render(renderer);
        self.keys.clear_just();
    }

    /// Feed input state and window size from platform events. Never marks
    /// the event handled.
    pub fn on_event(&mut self, event: &mut Event) {
        match *event.kind() {
            EventKind::KeyPressed { key, .. } => self.keys.press(key),
            EventKind::KeyReleased { key } => self.keys.release(key),
            EventKind::WindowResized { width, height } => self.on_viewport_resize(width, height),
            _ => {}
        }
    }

    pub fn keys(&self) -> &Input<KeyCode> {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut Input<KeyCode> {
        &mut self.keys
    }

    /// Run every bound [`NativeScript`] once.
    pub fn update_scripts(&mut self, dt: f32) {
        let mut queue = std::mem::take(&mut self.script_queue);
        queue.clear();
        self.store
            .each_entity_with::<(NativeScript,)>(|entity| queue.push(entity));

        for &entity in &queue {
            let Some((mut instance, mut created)) = self
                .store
                .try_get_mut::<NativeScript>(entity)
                .and_then(NativeScript::take)
            else {
                continue;
            };

            let mut ctx = script::ScriptContext::new(entity, &mut self.store, &self.keys);
            if !created {
                instance.on_create(&mut ctx);
                created = true;
            }
            instance.on_update(&mut ctx, dt);

            if let Some(script) = self.store.try_get_mut::<NativeScript>(entity) {
                script.restore(instance, created);
            }
        }

        self.script_queue = queue;
    }

    /// Draw every `(Transform, SpriteRenderer)` entity in one batch. Does
    /// nothing without a main camera.
    pub fn render<B: RenderBackend>(&mut self, renderer: &mut QuadBatchRenderer<B>) {
        let Some(view_projection) = self.main_camera_view_projection() else {
            return;
        };
        let mut batch = renderer.batch(&view_projection);
        self.store
            .query::<(&Transform, &SpriteRenderer)>(|_, (transform, sprite)| {
                batch.draw_transformed(&transform.matrix(), sprite.color, None, 1.0);
            });
    }

    /// Lazy, single-pass traversal of all live entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.store.entities()
    }

    pub fn each_entity(&self, f: impl FnMut(Entity)) {
        self.store.each_entity(f);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    /// Destroy every entity and forget the main camera.
    pub fn clear(&mut self) {
        self.main_camera = Entity::NULL;
        self.store.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::camera::{OrthographicParams, ProjectionType};
    use crate::config::RendererConfig;
    use crate::render::{Color, HeadlessBackend};

    fn renderer() -> QuadBatchRenderer<HeadlessBackend> {
        let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), RendererConfig::default());
        renderer
            .initialize(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"))
            .unwrap();
        renderer
    }

    #[test]
    fn entities_get_default_components() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("X");
        assert_eq!(scene.store().get::<Tag>(e).tag, "X");
        assert_eq!(*scene.store().get::<Transform>(e), Transform::IDENTITY);
    }

    #[test]
    fn destroying_main_camera_clears_it() {
        let mut scene = Scene::new("test");
        let camera = scene.create_camera("Cam");
        assert!(scene.set_main_camera(camera));
        scene.destroy_entity(camera);
        assert!(scene.main_camera().is_null());
        assert!(!scene.is_alive(camera));
    }

    #[test]
    fn main_camera_requires_camera_component() {
        let mut scene = Scene::new("test");
        let camera = scene.create_camera("Cam");
        let plain = scene.create_entity("Plain");
        assert!(scene.set_main_camera(camera));

        assert!(!scene.set_main_camera(plain));
        assert_eq!(scene.main_camera(), camera);

        assert!(scene.set_main_camera(Entity::NULL));
        assert!(scene.main_camera().is_null());
    }

    #[test]
    fn resize_skips_fixed_aspect_cameras() {
        let mut scene = Scene::new("test");
        let free = scene.create_camera("Free");
        let fixed = scene.create_camera("Fixed");
        scene.store_mut().get_mut::<Camera>(fixed).fixed_aspect_ratio = true;

        scene.on_viewport_resize(1280, 720);
        assert_eq!(scene.store().get::<Camera>(free).camera.viewport(), (1280.0, 720.0));
        assert_eq!(scene.store().get::<Camera>(fixed).camera.viewport(), (1.0, 1.0));

        let late = scene.create_camera("Late");
        assert_eq!(scene.store().get::<Camera>(late).camera.viewport(), (1280.0, 720.0));
    }

    #[test]
    fn single_sprite_frame() {
        let mut scene = Scene::new("test");
        let camera = scene.create_camera("Cam");
        scene
            .store_mut()
            .get_mut::<Camera>(camera)
            .camera
            .set_orthographic(OrthographicParams {
                size: 10.0,
                ..Default::default()
            });
        assert!(scene.set_main_camera(camera));

        let sprite = scene.create_entity("Sprite");
        scene
            .store_mut()
            .add(sprite, SpriteRenderer::new(Color::rgba(0.8, 0.3, 0.3, 1.0)));

        let mut renderer = renderer();
        scene.on_update(0.016, &mut renderer);

        let calls = renderer.backend().draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(renderer.stats().quad_count, 1);
        for vertex in &calls[0].vertices {
            assert_eq!(vertex.color, [0.8, 0.3, 0.3, 1.0]);
        }
        assert_eq!(
            calls[0].view_projection,
            *scene.store().get::<Camera>(camera).camera.projection()
        );
    }

    #[test]
    fn no_main_camera_draws_nothing() {
        let mut scene = Scene::new("test");
        let sprite = scene.create_entity("Sprite");
        scene.store_mut().add(sprite, SpriteRenderer::default());

        let mut renderer = renderer();
        scene.on_update(0.016, &mut renderer);
        assert!(renderer.backend().draw_calls().is_empty());
        assert_eq!(renderer.stats().quad_count, 0);
    }

    #[test]
    fn camera_transform_feeds_view() {
        let mut scene = Scene::new("test");
        let camera = scene.create_camera("Cam");
        scene.store_mut().get_mut::<Transform>(camera).translation = Vec3::new(3.0, 0.0, 0.0);
        scene.set_main_camera(camera);

        let vp = scene.main_camera_view_projection().unwrap();
        let clip = vp.transform_point3(Vec3::new(3.0, 0.0, 0.0));
        assert!(clip.x.abs() < 1e-6);
        assert_eq!(
            scene.store().get::<Camera>(camera).camera.projection_type(),
            ProjectionType::Orthographic
        );
    }

    #[derive(Default)]
    struct Log(Rc<RefCell<Vec<&'static str>>>);

    struct Recorder(Rc<RefCell<Vec<&'static str>>>);

    impl Behavior for Recorder {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.0.borrow_mut().push("create");
        }

        fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) {
            self.0.borrow_mut().push("update");
            ctx.get_mut::<Transform>().translation.x += dt;
        }

        fn on_destroy(&mut self) {
            self.0.borrow_mut().push("destroy");
        }
    }

    #[test]
    fn script_lifecycle() {
        let log = Log::default();
        let mut scene = Scene::new("test");
        let e = scene.create_entity("Scripted");
        scene
            .store_mut()
            .add(e, NativeScript::new(Recorder(log.0.clone())));

        scene.update_scripts(1.0);
        scene.update_scripts(1.0);
        assert_eq!(*log.0.borrow(), ["create", "update", "update"]);
        assert_eq!(scene.store().get::<Transform>(e).translation.x, 2.0);
        assert!(scene.store().get::<NativeScript>(e).is_created());

        scene.destroy_entity(e);
        assert_eq!(*log.0.borrow(), ["create", "update", "update", "destroy"]);
    }

    struct Rebinder;

    impl Behavior for Rebinder {
        fn name(&self) -> &str {
            "Rebinder"
        }

        fn on_update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) {
            ctx.get_mut::<NativeScript>().bind(Box::new(Rebinder));
        }
    }

    #[test]
    #[should_panic(expected = "while it is running")]
    fn script_cannot_rebind_itself() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("Scripted");
        scene.store_mut().add(e, NativeScript::new(Rebinder));
        scene.update_scripts(1.0);
    }

    #[test]
    fn never_created_script_is_not_destroyed() {
        let log = Log::default();
        let mut scene = Scene::new("test");
        let e = scene.create_entity("Scripted");
        scene
            .store_mut()
            .add(e, NativeScript::new(Recorder(log.0.clone())));
        drop(scene);
        assert!(log.0.borrow().is_empty());
    }

    #[test]
    fn key_events_drive_camera_controller() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("Cam");
        scene
            .store_mut()
            .add(e, NativeScript::new(CameraController::default()));

        let mut event = Event::new(EventKind::KeyPressed {
            key: KeyCode::Up,
            repeat_count: 0,
        });
        scene.on_event(&mut event);
        assert!(!event.handled());

        scene.update_scripts(0.2);
        assert!((scene.store().get::<Transform>(e).translation.y - 1.0).abs() < 1e-6);

        scene.on_event(&mut Event::new(EventKind::KeyReleased { key: KeyCode::Up }));
        scene.update_scripts(0.2);
        assert!((scene.store().get::<Transform>(e).translation.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn window_resize_event_resizes_viewport() {
        let mut scene = Scene::new("test");
        scene.on_event(&mut Event::new(EventKind::WindowResized {
            width: 640,
            height: 480,
        }));
        assert_eq!(scene.viewport(), (640, 480));
    }

    #[test]
    fn each_entity_visits_all() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let mut seen = Vec::new();
        scene.each_entity(|e| seen.push(e));
        seen.sort_by_key(|e| e.index());
        assert_eq!(seen, [a, b]);
        assert_eq!(scene.entities().count(), 2);
    }
}
