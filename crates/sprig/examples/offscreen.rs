//! Offscreen wgpu — the same renderer on a real device, drawing into a
//! texture with no window. Useful to check that the shader compiles and the
//! batch splits where expected on the local adapter.
//!
//! ```text
//! cargo run --example offscreen
//! ```

use sprig::prelude::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sprig::init_logging();

    let backend = WgpuBackend::headless(WIDTH, HEIGHT)?;
    let config = RendererConfig {
        assets_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/assets").into(),
        // Small on purpose so the frame needs several draw calls.
        max_quads_per_batch: 64,
        ..Default::default()
    };
    let mut renderer = QuadBatchRenderer::new(backend, config);
    renderer.initialize_from_config()?;
    log::info!(
        "renderer ready: {} texture slots, target {:?}",
        renderer.max_texture_slots(),
        renderer.backend().target_size()
    );

    let checker = checkerboard(&mut renderer)?;

    let mut scene = Scene::new("Offscreen");
    scene.on_viewport_resize(WIDTH, HEIGHT);
    let camera = scene.create_camera("Camera");
    scene.set_main_camera(camera);
    for i in 0..200 {
        let entity = scene.create_entity(format!("Sprite {i}"));
        let angle = i as f32 * 0.1;
        let radius = 0.5 + i as f32 * 0.02;
        *scene.store_mut().get_mut::<Transform>(entity) = Transform::from_xyz(
            angle.cos() * radius,
            angle.sin() * radius,
            0.0,
        )
        .with_scale(Vec3::splat(0.2));
        let t = i as f32 / 200.0;
        scene
            .store_mut()
            .add(entity, SpriteRenderer::new(Color::rgb(t, 1.0 - t, 0.5)));
    }

    renderer.set_viewport(0, 0, WIDTH, HEIGHT);
    renderer.clear_default();
    scene.on_update(1.0 / 60.0, &mut renderer);
    log::info!("scene pass: {}", renderer.stats());

    // A textured overlay drawn straight through the batch.
    let view_projection = scene.main_camera_view_projection().unwrap_or(Mat4::IDENTITY);
    {
        let mut batch = renderer.batch(&view_projection);
        batch.draw_quad(
            &Quad::new(Vec2::ZERO, Vec2::splat(2.0))
                .texture(checker)
                .tiling(4.0),
        );
    }
    log::info!("with overlay: {}", renderer.stats());

    renderer.shutdown();
    Ok(())
}

fn checkerboard(
    renderer: &mut QuadBatchRenderer<WgpuBackend>,
) -> Result<TextureHandle, RenderError> {
    const SIZE: u32 = 8;
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let v = if (x + y) % 2 == 0 { 255 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    renderer.create_texture(SIZE, SIZE, &pixels)
}
