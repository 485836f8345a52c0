//! # wgpu Backend — Quads on a Real GPU
//!
//! [`WgpuBackend`] renders into an offscreen color target that it owns. An
//! application presenting to a window copies or blits that target, or swaps
//! in a surface view per frame with [`set_target_view`](WgpuBackend::set_target_view).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ WgpuBackend                                              │
//! │                                                          │
//! │  pipelines: ShaderId → RenderPipeline (one per shader)   │
//! │    group 0: camera uniform (mat4x4, vertex-only)         │
//! │    group 1: 8 texture slots + 1 sampler (fragment-only)  │
//! │                                                          │
//! │  vertex buffer: max_quads × 4 × QuadVertex (COPY_DST)    │
//! │  index buffer:  static, written once                     │
//! │                                                          │
//! │  slots[0..8]: textures bound for the next draw           │
//! │    empty slots fall back to a 1x1 white texture          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `draw` records and submits its own render pass with `LoadOp::Load`,
//! so submission order equals draw order. `clear` is a separate pass.
//!
//! ## Shader Errors
//!
//! Shader compilation and pipeline creation run inside a validation error
//! scope. A failure comes back as [`RenderError::ShaderCompile`] instead of a
//! device-lost panic.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use super::Color;
use super::backend::{
    Capabilities, RenderBackend, ShaderId, Texture, TextureHandle, VIEW_PROJECTION_UNIFORM,
};
use super::vertex::QuadVertex;
use crate::error::RenderError;

/// Texture bindings declared by `texture.wgsl`.
pub const MAX_TEXTURE_SLOTS: u32 = 8;

/// Color format of the offscreen target created by [`WgpuBackend::headless`].
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug)]
pub struct WgpuTexture {
    id: u64,
    width: u32,
    height: u32,
    view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl WgpuTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl Texture for WgpuTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn native_id(&self) -> u64 {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Target {
    texture: Option<wgpu::Texture>,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    target: Target,
    camera_layout: wgpu::BindGroupLayout,
    textures_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    pipelines: HashMap<ShaderId, wgpu::RenderPipeline>,
    next_shader_id: u32,
    bound_shader: Option<ShaderId>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    slots: Vec<Option<TextureHandle>>,
    fallback: Option<TextureHandle>,
    next_texture_id: u64,
    viewport: Option<[u32; 4]>,
}

impl WgpuBackend {
    /// Create a device with no surface and an offscreen target of the given
    /// size.
    pub fn headless(width: u32, height: u32) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| RenderError::Backend(format!("no suitable GPU adapter: {e}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("sprig device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| RenderError::Backend(format!("failed to create GPU device: {e}")))?;

        log::info!("wgpu adapter: {}", adapter.get_info().name);
        Ok(Self::new(device, queue, TARGET_FORMAT, width, height))
    }

    /// Wrap an existing device. `format` must match whatever view is later
    /// passed to [`set_target_view`](Self::set_target_view).
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad camera layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_TEXTURE_SLOTS,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad textures layout"),
            entries: &texture_entries,
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad camera buffer"),
            contents: bytemuck::cast_slice(&Mat4::IDENTITY.to_cols_array()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Repeat so tiling factors > 1 wrap.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let target = Self::create_target(&device, format, width, height);

        Self {
            device,
            queue,
            format,
            target,
            camera_layout,
            textures_layout,
            camera_buffer,
            camera_bind_group,
            sampler,
            pipelines: HashMap::new(),
            next_shader_id: 1,
            bound_shader: None,
            vertex_buffer: None,
            index_buffer: None,
            slots: vec![None; MAX_TEXTURE_SLOTS as usize],
            fallback: None,
            next_texture_id: 1,
            viewport: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The owned offscreen target, if one is in use.
    pub fn target_texture(&self) -> Option<&wgpu::Texture> {
        self.target.texture.as_ref()
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    /// Recreate the offscreen target at a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.target = Self::create_target(&self.device, self.format, width, height);
        }
    }

    /// Render into an external view (e.g. the current surface frame) until
    /// the next call or [`resize`](Self::resize).
    pub fn set_target_view(&mut self, view: wgpu::TextureView, width: u32, height: u32) {
        self.target = Target {
            texture: None,
            view,
            width,
            height,
        };
    }

    fn create_target(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Target {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprig offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Target {
            texture: Some(texture),
            view,
            width,
            height,
        }
    }

    fn build_pipeline(&self, shader: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("quad pipeline layout"),
                bind_group_layouts: &[&self.camera_layout, &self.textures_layout],
                push_constant_ranges: &[],
            });

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quad pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[QuadVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn wgpu_texture(texture: &TextureHandle) -> &WgpuTexture {
        match texture.as_any().downcast_ref::<WgpuTexture>() {
            Some(texture) => texture,
            None => panic!("{texture:?} was not created by this backend"),
        }
    }

    fn color_attachment(&self, load: wgpu::LoadOp<wgpu::Color>) -> wgpu::RenderPassColorAttachment<'_> {
        wgpu::RenderPassColorAttachment {
            view: &self.target.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn capabilities(&self) -> Capabilities {
        let limit = self.device.limits().max_sampled_textures_per_shader_stage;
        Capabilities {
            max_texture_slots: MAX_TEXTURE_SLOTS.min(limit),
        }
    }

    fn load_shader(&mut self, path: &Path) -> Result<ShaderId, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        })?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("quad shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let pipeline = self.build_pipeline(&module);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }

        let id = ShaderId(self.next_shader_id);
        self.next_shader_id += 1;
        self.pipelines.insert(id, pipeline);
        log::info!("loaded shader {}", path.display());
        Ok(id)
    }

    fn release_shader(&mut self, shader: ShaderId) {
        self.pipelines.remove(&shader);
        if self.bound_shader == Some(shader) {
            self.bound_shader = None;
        }
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        self.bound_shader = Some(shader);
    }

    fn unbind_shader(&mut self) {
        self.bound_shader = None;
    }

    fn set_uniform_mat4(&mut self, _shader: ShaderId, name: &str, value: &Mat4) {
        if name == VIEW_PROJECTION_UNIFORM {
            self.queue
                .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&value.to_cols_array()));
        } else {
            log::warn!("unknown mat4 uniform '{name}'");
        }
    }

    fn set_uniform_int_array(&mut self, _shader: ShaderId, _name: &str, _values: &[i32]) {
        // Slot bindings are fixed in the WGSL layout.
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::Texture {
                width,
                height,
                message: format!("expected {expected} bytes of RGBA8, got {}", rgba.len()),
            });
        }

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("quad texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = self.next_texture_id;
        self.next_texture_id += 1;
        let handle: TextureHandle = Arc::new(WgpuTexture {
            id,
            width,
            height,
            view,
            _texture: texture,
        });
        if self.fallback.is_none() && width == 1 && height == 1 && rgba == [255; 4] {
            self.fallback = Some(handle.clone());
        }
        Ok(handle)
    }

    fn allocate_quad_buffers(
        &mut self,
        max_vertices: usize,
        indices: &[u32],
    ) -> Result<(), RenderError> {
        let size = (max_vertices * std::mem::size_of::<QuadVertex>()) as wgpu::BufferAddress;
        if size > self.device.limits().max_buffer_size {
            return Err(RenderError::Backend(format!(
                "vertex buffer of {size} bytes exceeds the device limit"
            )));
        }
        self.vertex_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad vertex buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.index_buffer = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
        Ok(())
    }

    fn release_quad_buffers(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.fallback = None;
    }

    fn bind_texture(&mut self, slot: u32, texture: &TextureHandle) {
        match self.slots.get_mut(slot as usize) {
            Some(entry) => *entry = Some(texture.clone()),
            None => log::error!("texture slot {slot} out of range"),
        }
    }

    fn draw(&mut self, vertices: &[QuadVertex], index_count: u32) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer)
        else {
            log::error!("draw before quad buffers were allocated");
            return;
        };
        let Some(pipeline) = self.bound_shader.and_then(|id| self.pipelines.get(&id)) else {
            log::error!("draw without a bound shader");
            return;
        };
        let Some(fallback) = self.fallback.as_ref().or(self.slots[0].as_ref()) else {
            log::error!("draw with no texture bound");
            return;
        };

        let fallback_view = Self::wgpu_texture(fallback).view();
        let views: Vec<&wgpu::TextureView> = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map_or(fallback_view, |t| Self::wgpu_texture(t).view()))
            .collect();
        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MAX_TEXTURE_SLOTS,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        let textures_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad textures bind group"),
            layout: &self.textures_layout,
            entries: &entries,
        });

        self.queue
            .write_buffer(vertex_buffer, 0, bytemuck::cast_slice(vertices));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad batch encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad batch pass"),
                color_attachments: &[Some(self.color_attachment(wgpu::LoadOp::Load))],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some([x, y, w, h]) = self.viewport {
                pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
            }
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &textures_bind_group, &[]);
            let used = (vertices.len() * std::mem::size_of::<QuadVertex>()) as wgpu::BufferAddress;
            pass.set_vertex_buffer(0, vertex_buffer.slice(..used));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn clear(&mut self, color: Color) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(self.color_attachment(wgpu::LoadOp::Clear(
                    wgpu::Color {
                        r: color.r as f64,
                        g: color.g as f64,
                        b: color.b as f64,
                        a: color.a as f64,
                    },
                )))],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let (tw, th) = (self.target.width, self.target.height);
        if x + width > tw || y + height > th {
            log::warn!("viewport {width}x{height}+{x}+{y} exceeds {tw}x{th} target, clamping");
        }
        let x = x.min(tw.saturating_sub(1));
        let y = y.min(th.saturating_sub(1));
        self.viewport = Some([x, y, width.min(tw - x).max(1), height.min(th - y).max(1)]);
    }
}
