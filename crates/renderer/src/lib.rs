//! Renderer: wgpu init + depth + OBJ mesh, light marker and ground grid.
//! wgpu = 23.x, winit = 0.30.x

pub mod backend;
pub mod grid;
pub mod mesh;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::{AssetResult, LoadOptions, VertexLayout, VertexPacking, primitives};
use bytemuck::{Pod, Zeroable};
use corelib::{Mat4, Vec3, camera::OrbitalCamera};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandBuffer, CommandEncoder, CommandEncoderDescriptor, DepthBiasState, DepthStencilState,
    Device, DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor,
    Limits, LoadOp, Operations, PipelineLayout, PipelineLayoutDescriptor, PowerPreference,
    PresentMode, PrimitiveTopology, Queue, RenderPassColorAttachment, RenderPassDescriptor,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource,
    ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
    VertexBufferLayout, VertexState, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use backend::{BufferKind, DrawSubmit, GpuAllocator, WgpuVertexLayouts};
pub use grid::{Grid, GridGeometry, LineVertex, grid_geometry};
pub use mesh::MeshResource;
pub use wgpu::Backends;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;
const GRID_SIZE: f32 = 10.0;
const GRID_SPACING: f32 = 1.0;
const LIGHT_MARKER_RADIUS: f32 = 0.1;

/// Per-frame knobs exposed in the control panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSettings {
    pub show_grid: bool,
    pub show_light: bool,
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub object_color: [f32; 3],
    pub shininess: f32,
    pub clear_color: [f32; 3],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_light: true,
            light_position: [3.0, 1.0, 3.0],
            light_color: [1.0, 1.0, 1.0],
            object_color: [0.8, 0.8, 0.8],
            shininess: 255.0,
            clear_color: [0.2, 0.3, 0.3],
        }
    }
}

/// Scene UBO (16-byte aligned). Shared by the mesh and line shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light_pos: [f32; 4],
    view_pos: [f32; 4],
    light_color: [f32; 4],
    object_color: [f32; 4],
    params: [f32; 4],
}

impl SceneUniform {
    fn new(
        view_proj: Mat4,
        model: Mat4,
        camera: &OrbitalCamera,
        s: &SceneSettings,
        unlit: bool,
    ) -> Self {
        let v4 = |v: [f32; 3], w: f32| [v[0], v[1], v[2], w];
        let color = if unlit { s.light_color } else { s.object_color };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_pos: v4(s.light_position, 1.0),
            view_pos: v4(camera.position().to_array(), 1.0),
            light_color: v4(s.light_color, 0.0),
            object_color: v4(color, s.shininess.max(1.0)),
            params: [if unlit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// One uniform buffer + its bind group.
struct UniformSlot {
    buf: Buffer,
    bg: BindGroup,
}

impl UniformSlot {
    fn new(device: &Device, layout: &BindGroupLayout, label: &str) -> Self {
        let init = SceneUniform::zeroed();
        let buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buf.as_entire_binding(),
            }],
        });
        Self { buf, bg }
    }
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipelines
    pipeline_layout: PipelineLayout,
    mesh_shader: ShaderModule,
    /// Keyed by [`VertexLayout::shape`].
    mesh_pipelines: HashMap<VertexLayout, RenderPipeline>,
    line_pipeline: RenderPipeline,

    // Geometry
    model: MeshResource<Buffer>,
    light_marker: MeshResource<Buffer>,
    grid: Grid,

    // Uniforms
    object_ubo: UniformSlot,
    marker_ubo: UniformSlot,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, backends: Backends) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable GPU adapter for backends {backends:?}"))?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("glengine Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or_default(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let mesh_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let line_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Line WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        // ==== Scene BGL ====
        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<SceneUniform>() as u64),
                },
                count: None,
            }],
        });
        let object_ubo = UniformSlot::new(&device, &scene_bgl, "Object UBO");
        let marker_ubo = UniformSlot::new(&device, &scene_bgl, "Marker UBO");

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene PipelineLayout"),
            bind_group_layouts: &[&scene_bgl],
            push_constant_ranges: &[],
        });
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &line_shader,
            surface_format,
            &[LineVertex::LAYOUT],
            PrimitiveTopology::LineList,
            "Line Pipeline",
        );

        // ==== Geometry ====
        let grid = Grid::new(&device, GRID_SIZE, GRID_SPACING);
        let mut light_marker = MeshResource::new("Light marker");
        light_marker
            .load_data(
                &device,
                &primitives::uv_sphere(LIGHT_MARKER_RADIUS, 36, 18),
                VertexPacking::Interleaved,
            )
            .context("Failed to build light marker mesh")?;

        let mut state = Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            pipeline_layout,
            mesh_shader,
            mesh_pipelines: HashMap::new(),
            line_pipeline,
            model: MeshResource::new("Model"),
            light_marker,
            grid,
            object_ubo,
            marker_ubo,
            depth_view,
            width,
            height,
        };
        if let Some(layout) = state.light_marker.layout().cloned() {
            state.ensure_mesh_pipeline(&layout);
        }
        Ok(state)
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[inline]
    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Load an OBJ model, replacing the current one only on success.
    pub fn load_model(
        &mut self,
        path: impl AsRef<Path>,
        options: &LoadOptions,
        packing: VertexPacking,
    ) -> AssetResult<()> {
        let path = path.as_ref();
        self.model.load(&self.device, path, options, packing)?;
        if let Some(layout) = self.model.layout().cloned() {
            self.ensure_mesh_pipeline(&layout);
        }
        log::info!(
            "Loaded {}: {} vertices, {} triangles ({:?})",
            path.display(),
            self.model.vertex_count(),
            self.model.index_count() / 3,
            packing
        );
        Ok(())
    }

    /// (vertices, triangles) of the current model; zero when none is loaded.
    pub fn model_stats(&self) -> (usize, u32) {
        (self.model.vertex_count(), self.model.index_count() / 3)
    }

    pub fn release_model(&mut self) {
        self.model.release();
    }

    fn mesh_pipeline(&self, mesh: &MeshResource<Buffer>) -> Option<&RenderPipeline> {
        self.mesh_pipelines.get(&mesh.layout()?.shape())
    }

    fn ensure_mesh_pipeline(&mut self, layout: &VertexLayout) {
        let key = layout.shape();
        if self.mesh_pipelines.contains_key(&key) {
            return;
        }
        log::debug!("Building mesh pipeline for {} vertex stream(s)", layout.streams.len());
        let wgpu_layouts = WgpuVertexLayouts::new(layout);
        let pipeline = create_pipeline(
            &self.device,
            &self.pipeline_layout,
            &self.mesh_shader,
            self.surface_format,
            &wgpu_layouts.buffers(),
            PrimitiveTopology::TriangleList,
            "Mesh Pipeline",
        );
        self.mesh_pipelines.insert(key, pipeline);
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: scene pass, then `overlay` (GUI) on top.
    ///
    /// `overlay` records into the same encoder and may return extra command
    /// buffers that must be submitted before it.
    pub fn render<F>(
        &mut self,
        camera: &OrbitalCamera,
        settings: &SceneSettings,
        overlay: F,
    ) -> Result<(), SurfaceError>
    where
        F: FnOnce(&Device, &Queue, &mut CommandEncoder, &TextureView) -> Vec<CommandBuffer>,
    {
        // --- update uniforms
        let aspect = self.width as f32 / self.height as f32;
        let view_proj = camera.projection(aspect, Z_NEAR, Z_FAR) * camera.view_matrix();
        let object = SceneUniform::new(view_proj, Mat4::IDENTITY, camera, settings, false);
        let marker_model = Mat4::from_translation(Vec3::from(settings.light_position));
        let marker = SceneUniform::new(view_proj, marker_model, camera, settings, true);
        self.queue
            .write_buffer(&self.object_ubo.buf, 0, bytemuck::bytes_of(&object));
        self.queue
            .write_buffer(&self.marker_ubo.buf, 0, bytemuck::bytes_of(&marker));

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let [r, g, b] = settings.clear_color;
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.mesh_pipeline(&self.model) {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.object_ubo.bg, &[]);
                self.model.draw(&mut rpass);
            }

            if settings.show_light {
                if let Some(pipeline) = self.mesh_pipeline(&self.light_marker) {
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, &self.marker_ubo.bg, &[]);
                    self.light_marker.draw(&mut rpass);
                }
            }

            if settings.show_grid {
                rpass.set_pipeline(&self.line_pipeline);
                rpass.set_bind_group(0, &self.object_ubo.bg, &[]);
                self.grid.draw(&mut rpass);
            }
        }

        let extra = overlay(&self.device, &self.queue, &mut encoder, &view);
        self.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

fn create_pipeline(
    device: &Device,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    format: TextureFormat,
    buffers: &[VertexBufferLayout<'_>],
    topology: PrimitiveTopology,
    label: &str,
) -> RenderPipeline {
    let cull_mode = match topology {
        PrimitiveTopology::TriangleList => Some(wgpu::Face::Back),
        _ => None,
    };
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
