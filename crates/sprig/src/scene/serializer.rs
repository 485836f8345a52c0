//! # Scene Files — Save and Load Scenes as JSON
//!
//! A scene file is a header plus one record per entity. Each record lists
//! only the components the entity actually has:
//!
//! ```json
//! {
//!   "magic": 2912590059,
//!   "version": 65536,
//!   "scene": "Level 1",
//!   "main_camera": 0,
//!   "entities": [
//!     { "id": 0, "tag": { "tag": "Cam" }, "transform": { ... },
//!       "camera": { "fixed_aspect_ratio": false, "projection_type": "Orthographic", ... } },
//!     { "id": 1, "tag": { "tag": "Player" }, "sprite_renderer": { "color": { ... } },
//!       "native_script": { "script": "Camera Controller" } }
//!   ]
//! }
//! ```
//!
//! Ids are only meaningful inside one file; loading creates fresh entities
//! and remaps the main camera. Scripts are rebound by name through a
//! [`ScriptRegistry`]. An unknown name leaves an unbound script slot so a
//! later save keeps it.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Scene;
use super::components::{Camera, NativeScript, SpriteRenderer, Tag, Transform};
use super::script::ScriptRegistry;
use crate::camera::{OrthographicParams, PerspectiveParams, ProjectionCamera, ProjectionType};
use crate::ecs::Entity;
use crate::error::SerializeError;

pub const SCENE_MAGIC: u32 = 0xAD9A_98EB;
pub const SCENE_VERSION: u32 = 0x0001_0000;

// ── Document (JSON wire format) ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub magic: u32,
    pub version: u32,
    pub scene: String,
    #[serde(default)]
    pub main_camera: Option<u64>,
    #[serde(default)]
    pub entities: Vec<EntityDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_renderer: Option<SpriteRenderer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_script: Option<ScriptDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDocument {
    #[serde(default)]
    pub fixed_aspect_ratio: bool,
    pub projection_type: String,
    pub perspective: PerspectiveDocument,
    pub orthographic: OrthographicDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveDocument {
    /// Degrees.
    pub vertical_fov: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthographicDocument {
    pub size: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub script: String,
}

impl From<&Camera> for CameraDocument {
    fn from(component: &Camera) -> Self {
        let perspective = component.camera.perspective_params();
        let orthographic = component.camera.orthographic_params();
        Self {
            fixed_aspect_ratio: component.fixed_aspect_ratio,
            projection_type: component.camera.projection_type().name().to_owned(),
            perspective: PerspectiveDocument {
                vertical_fov: perspective.fov,
                near: perspective.near,
                far: perspective.far,
            },
            orthographic: OrthographicDocument {
                size: orthographic.size,
                near: orthographic.near,
                far: orthographic.far,
            },
        }
    }
}

impl CameraDocument {
    fn to_component(&self, viewport: (u32, u32)) -> Camera {
        let mut camera = ProjectionCamera::default();
        camera.set_viewport(viewport.0 as f32, viewport.1 as f32);
        camera.set_perspective(PerspectiveParams {
            fov: self.perspective.vertical_fov,
            near: self.perspective.near,
            far: self.perspective.far,
        });
        camera.set_orthographic(OrthographicParams {
            size: self.orthographic.size,
            near: self.orthographic.near,
            far: self.orthographic.far,
        });
        camera.set_projection_type(ProjectionType::from_name(&self.projection_type));
        Camera {
            camera,
            fixed_aspect_ratio: self.fixed_aspect_ratio,
        }
    }
}

// ── Serializer ────────────────────────────────────────────────────────────

pub struct SceneSerializer {
    registry: ScriptRegistry,
}

impl SceneSerializer {
    /// A serializer that can rebind the built-in scripts.
    pub fn new() -> Self {
        Self::with_registry(ScriptRegistry::with_builtins())
    }

    pub fn with_registry(registry: ScriptRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.registry
    }

    /// Snapshot every entity, in slot order.
    pub fn to_document(&self, scene: &Scene) -> SceneDocument {
        let store = scene.store();
        let mut entities = Vec::with_capacity(scene.len());
        scene.each_entity(|entity| {
            entities.push(EntityDocument {
                id: entity_id(entity),
                tag: store.try_get::<Tag>(entity).cloned(),
                transform: store.try_get::<Transform>(entity).copied(),
                camera: store.try_get::<Camera>(entity).map(CameraDocument::from),
                sprite_renderer: store.try_get::<SpriteRenderer>(entity).copied(),
                native_script: store.try_get::<NativeScript>(entity).map(|script| {
                    ScriptDocument {
                        script: script.name().to_owned(),
                    }
                }),
            });
        });

        let main_camera = scene.main_camera();
        SceneDocument {
            magic: SCENE_MAGIC,
            version: SCENE_VERSION,
            scene: scene.name().to_owned(),
            main_camera: (!main_camera.is_null()).then(|| entity_id(main_camera)),
            entities,
        }
    }

    pub fn to_json(&self, scene: &Scene) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(&self.to_document(scene))?)
    }

    pub fn serialize(&self, scene: &Scene, path: impl AsRef<Path>) -> Result<(), SerializeError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json(scene)?)?;
        log::info!("saved scene '{}' to {}", scene.name(), path.display());
        Ok(())
    }

    /// Replace the contents of `scene` with `document`.
    ///
    /// The document is validated first; on error `scene` is untouched.
    pub fn load_document(
        &self,
        scene: &mut Scene,
        document: &SceneDocument,
    ) -> Result<(), SerializeError> {
        if document.magic != SCENE_MAGIC {
            return Err(SerializeError::BadMagic {
                found: document.magic,
            });
        }
        if document.version != SCENE_VERSION {
            return Err(SerializeError::UnsupportedVersion {
                found: document.version,
                expected: SCENE_VERSION,
            });
        }
        if let Some(id) = document.main_camera {
            if !document.entities.iter().any(|e| e.id == id) {
                return Err(SerializeError::UnknownEntity(id));
            }
        }

        scene.clear();
        scene.set_name(document.scene.clone());

        let mut ids: HashMap<u64, Entity> = HashMap::with_capacity(document.entities.len());
        for record in &document.entities {
            let entity = self.load_entity(scene, record);
            if ids.insert(record.id, entity).is_some() {
                log::warn!("duplicate entity id {} in scene '{}'", record.id, document.scene);
            }
        }

        if let Some(entity) = document.main_camera.and_then(|id| ids.get(&id)) {
            scene.set_main_camera(*entity);
        }

        log::info!(
            "loaded scene '{}' ({} entities)",
            document.scene,
            document.entities.len()
        );
        Ok(())
    }

    pub fn from_json(&self, scene: &mut Scene, json: &str) -> Result<(), SerializeError> {
        let document: SceneDocument = serde_json::from_str(json)?;
        self.load_document(scene, &document)
    }

    pub fn deserialize(
        &self,
        scene: &mut Scene,
        path: impl AsRef<Path>,
    ) -> Result<(), SerializeError> {
        let json = std::fs::read_to_string(path)?;
        self.from_json(scene, &json)
    }

    /// Only the components present in `record` are attached, so an entity
    /// saved without a `Tag` or `Transform` loads without one.
    fn load_entity(&self, scene: &mut Scene, record: &EntityDocument) -> Entity {
        let viewport = scene.viewport();
        let store = scene.store_mut();
        let entity = store.create();

        if let Some(tag) = &record.tag {
            store.add(entity, tag.clone());
        }
        if let Some(transform) = record.transform {
            store.add(entity, transform);
        }
        if let Some(camera) = &record.camera {
            store.add(entity, camera.to_component(viewport));
        }
        if let Some(sprite) = record.sprite_renderer {
            store.add(entity, sprite);
        }
        if let Some(script) = &record.native_script {
            let component = match self.registry.create(&script.script) {
                Some(behavior) => NativeScript::from_boxed(behavior),
                None => {
                    log::warn!("unknown native script '{}', leaving it unbound", script.script);
                    NativeScript::unbound(script.script.clone())
                }
            };
            store.add(entity, component);
        }
        entity
    }
}

impl Default for SceneSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn entity_id(entity: Entity) -> u64 {
    u64::from(entity.index())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::render::Color;
    use crate::scene::CameraController;

    fn sample_scene() -> (Scene, Entity, Entity) {
        let mut scene = Scene::new("Sample");
        let camera = scene.create_camera("Main Camera");
        {
            let component = scene.store_mut().get_mut::<Camera>(camera);
            component.fixed_aspect_ratio = true;
            component.camera.set_perspective(PerspectiveParams {
                fov: 60.0,
                near: 0.1,
                far: 100.0,
            });
        }
        scene.set_main_camera(camera);
        scene
            .store_mut()
            .add(camera, NativeScript::new(CameraController::default()));

        let sprite = scene.create_entity("Sprite");
        *scene.store_mut().get_mut::<Transform>(sprite) = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(Vec3::new(0.0, 0.0, 0.5))
            .with_scale(Vec3::splat(2.0));
        scene
            .store_mut()
            .add(sprite, SpriteRenderer::new(Color::rgba(0.8, 0.3, 0.3, 1.0)));
        (scene, camera, sprite)
    }

    fn find(scene: &Scene, tag: &str) -> Entity {
        scene
            .entities()
            .find(|&e| scene.store().try_get::<Tag>(e).is_some_and(|t| t.tag == tag))
            .unwrap()
    }

    #[test]
    fn components_survive_a_round_trip() {
        let (scene, camera, sprite) = sample_scene();
        let serializer = SceneSerializer::new();
        let json = serializer.to_json(&scene).unwrap();

        let mut loaded = Scene::default();
        serializer.from_json(&mut loaded, &json).unwrap();

        assert_eq!(loaded.name(), "Sample");
        assert_eq!(loaded.len(), 2);

        let loaded_camera = find(&loaded, "Main Camera");
        assert_eq!(loaded.main_camera(), loaded_camera);
        let before = scene.store().get::<Camera>(camera);
        let after = loaded.store().get::<Camera>(loaded_camera);
        assert!(after.fixed_aspect_ratio);
        assert_eq!(after.camera.projection_type(), ProjectionType::Perspective);
        assert_eq!(after.camera.perspective_params(), before.camera.perspective_params());
        let script = loaded.store().get::<NativeScript>(loaded_camera);
        assert!(script.is_bound());
        assert_eq!(script.name(), "Camera Controller");

        let loaded_sprite = find(&loaded, "Sprite");
        assert_eq!(
            loaded.store().get::<Transform>(loaded_sprite),
            scene.store().get::<Transform>(sprite)
        );
        assert_eq!(
            loaded.store().get::<SpriteRenderer>(loaded_sprite).color,
            Color::rgba(0.8, 0.3, 0.3, 1.0)
        );
        assert!(!loaded.store().has::<Camera>(loaded_sprite));
        assert!(!loaded.store().has::<NativeScript>(loaded_sprite));
    }

    #[test]
    fn missing_default_components_stay_missing() {
        let mut scene = Scene::new("Bare");
        let bare = scene.create_entity("Bare");
        scene.store_mut().remove::<Tag>(bare);
        scene.store_mut().remove::<Transform>(bare);
        let tagged = scene.create_entity("Tagged");
        scene.store_mut().remove::<Transform>(tagged);

        let serializer = SceneSerializer::new();
        let json = serializer.to_json(&scene).unwrap();
        let mut loaded = Scene::default();
        serializer.from_json(&mut loaded, &json).unwrap();

        assert_eq!(loaded.len(), 2);
        let loaded_tagged = find(&loaded, "Tagged");
        assert!(!loaded.store().has::<Transform>(loaded_tagged));
        let loaded_bare = loaded.entities().find(|&e| e != loaded_tagged).unwrap();
        assert!(!loaded.store().has::<Tag>(loaded_bare));
        assert!(!loaded.store().has::<Transform>(loaded_bare));
    }

    #[test]
    fn bad_magic_leaves_scene_untouched() {
        let (scene, _, _) = sample_scene();
        let serializer = SceneSerializer::new();
        let mut document = serializer.to_document(&scene);
        document.magic = 0xDEAD_BEEF;

        let (mut target, _, _) = sample_scene();
        let err = serializer.load_document(&mut target, &document).unwrap_err();
        assert!(matches!(err, SerializeError::BadMagic { found: 0xDEAD_BEEF }));
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let serializer = SceneSerializer::new();
        let mut document = serializer.to_document(&Scene::default());
        document.version = 0x0002_0000;
        let err = serializer
            .load_document(&mut Scene::default(), &document)
            .unwrap_err();
        assert!(matches!(err, SerializeError::UnsupportedVersion { .. }));
    }

    #[test]
    fn dangling_main_camera_is_rejected() {
        let serializer = SceneSerializer::new();
        let mut document = serializer.to_document(&Scene::default());
        document.main_camera = Some(42);
        let err = serializer
            .load_document(&mut Scene::default(), &document)
            .unwrap_err();
        assert!(matches!(err, SerializeError::UnknownEntity(42)));
    }

    #[test]
    fn unknown_script_stays_unbound_and_is_saved_again() {
        let json = format!(
            r#"{{"magic":{SCENE_MAGIC},"version":{SCENE_VERSION},"scene":"s",
                "entities":[{{"id":7,"native_script":{{"script":"Mystery"}}}}]}}"#
        );
        let serializer = SceneSerializer::new();
        let mut scene = Scene::default();
        serializer.from_json(&mut scene, &json).unwrap();

        let entity = scene.entities().next().unwrap();
        let script = scene.store().get::<NativeScript>(entity);
        assert!(!script.is_bound());
        assert!(!scene.store().has::<Tag>(entity));

        let document = serializer.to_document(&scene);
        assert_eq!(
            document.entities[0].native_script.as_ref().unwrap().script,
            "Mystery"
        );
    }

    #[test]
    fn unknown_projection_type_loads_as_identity() {
        let json = format!(
            r#"{{"magic":{SCENE_MAGIC},"version":{SCENE_VERSION},"scene":"s",
                "entities":[{{"id":0,"camera":{{"projection_type":"Fisheye",
                "perspective":{{"vertical_fov":45.0,"near":0.01,"far":1000.0}},
                "orthographic":{{"size":10.0,"near":-1.0,"far":1.0}}}}}}]}}"#
        );
        let mut scene = Scene::default();
        SceneSerializer::new().from_json(&mut scene, &json).unwrap();
        let entity = scene.entities().next().unwrap();
        let camera = scene.store().get::<Camera>(entity);
        assert_eq!(camera.camera.projection_type(), ProjectionType::Unknown);
        assert_eq!(*camera.camera.projection(), glam::Mat4::IDENTITY);
    }

    #[test]
    fn file_round_trip() {
        let (scene, _, _) = sample_scene();
        let path = std::env::temp_dir().join(format!("sprig-scene-{}.json", std::process::id()));
        let serializer = SceneSerializer::new();
        serializer.serialize(&scene, &path).unwrap();

        let mut loaded = Scene::default();
        serializer.deserialize(&mut loaded, &path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.len(), scene.len());
    }
}
