//! Headless scene — a scripted camera flying over a grid of sprites, rendered
//! through the recording backend. Prints per-frame batch stats, writes a
//! Chrome trace and saves the scene to JSON.
//!
//! ```text
//! RUST_LOG=debug cargo run --example headless_scene
//! ```

use std::time::Duration;

use sprig::prelude::*;

const FRAMES: u32 = 120;
const GRID: i32 = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sprig::init_logging();

    let profiler = Profiler::new();
    let out_dir = std::env::temp_dir();
    profiler.begin_session("Headless", out_dir.join("sprig-headless-trace.json"))?;

    let config = RendererConfig {
        assets_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/assets").into(),
        max_quads_per_batch: 1_000,
        ..Default::default()
    };
    let mut renderer = QuadBatchRenderer::new(HeadlessBackend::new(), config);
    {
        let _scope = profiler.scope("Renderer::initialize");
        renderer.initialize_from_config()?;
    }

    let mut scene = build_scene();
    let mut layers = LayerStack::new();
    layers.push_overlay(Box::new(FrameLogger::default()));

    let mut time = Time::new();
    for frame in 0..FRAMES {
        let _frame = profiler.scope("Frame");
        time.advance(Duration::from_millis(16));

        // Hold the right arrow for the first half, then resize once.
        let mut events = Vec::new();
        if frame == 0 {
            events.push(Event::new(EventKind::KeyPressed {
                key: KeyCode::Right,
                repeat_count: 0,
            }));
        }
        if frame == FRAMES / 2 {
            events.push(Event::new(EventKind::KeyReleased { key: KeyCode::Right }));
            events.push(Event::new(EventKind::WindowResized {
                width: 1920,
                height: 1080,
            }));
        }
        for mut event in events {
            layers.on_event(&mut event);
            scene.on_event(&mut event);
        }

        renderer.reset_stats();
        renderer.clear_default();
        {
            let _scope = profiler.scope("Scene::on_update");
            scene.on_update(time.delta_secs(), &mut renderer);
        }
        layers.on_update(time.delta_secs());

        if frame % 30 == 0 {
            log::info!("frame {frame}: {}", renderer.stats());
        }
    }

    let camera = scene.main_camera();
    let position = scene.store().get::<Transform>(camera).translation;
    log::info!("camera ended at {position}");

    let serializer = SceneSerializer::new();
    let scene_path = out_dir.join("sprig-headless-scene.json");
    serializer.serialize(&scene, &scene_path)?;

    let mut reloaded = Scene::default();
    serializer.deserialize(&mut reloaded, &scene_path)?;
    log::info!(
        "reloaded '{}' with {} entities from {}",
        reloaded.name(),
        reloaded.len(),
        scene_path.display()
    );

    renderer.shutdown();
    profiler.end_session()?;
    Ok(())
}

fn build_scene() -> Scene {
    let mut scene = Scene::new("Sprite Grid");
    scene.on_viewport_resize(1280, 720);

    let camera = scene.create_camera("Main Camera");
    {
        let cam = scene.store_mut().get_mut::<Camera>(camera);
        cam.camera.set_orthographic_size(GRID as f32);
    }
    scene
        .store_mut()
        .add(camera, NativeScript::new(CameraController::default()));
    scene.set_main_camera(camera);

    let half = GRID / 2;
    for y in -half..half {
        for x in -half..half {
            let entity = scene.create_entity(format!("Tile {x},{y}"));
            let store = scene.store_mut();
            *store.get_mut::<Transform>(entity) =
                Transform::from_xyz(x as f32, y as f32, 0.0).with_scale(Vec3::splat(0.9));
            let shade = ((x + y).rem_euclid(2)) as f32 * 0.4 + 0.3;
            store.add(entity, SpriteRenderer::new(Color::rgb(shade, 0.3, 0.8 - shade * 0.5)));
        }
    }
    scene
}

#[derive(Default)]
struct FrameLogger {
    frames: u64,
}

impl Layer for FrameLogger {
    fn name(&self) -> &str {
        "FrameLogger"
    }

    fn on_update(&mut self, _dt: f32) {
        self.frames += 1;
    }

    fn on_event(&mut self, event: &mut Event) {
        log::debug!("frame {}: {} ({:?})", self.frames, event.name(), event.category());
    }

    fn on_detach(&mut self) {
        log::info!("{} saw {} frames", self.name(), self.frames);
    }
}
