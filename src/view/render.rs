use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::model::rig::{skin_vertices, AlphaMode, MeshVertex, Model, TextureData};
use crate::model::scene::{EnvironmentMap, LightRig, ModelSlot};
use crate::model::{Camera, ModelInstance, SceneGraph};
use crate::view::gpu_init::GpuContext;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
/// How strongly the environment tints lit surfaces.
const ENV_LIGHT_STRENGTH: f32 = 0.35;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl From<&MeshVertex> for GpuVertex {
    fn from(v: &MeshVertex) -> Self {
        Self { position: v.position.to_array(), normal: v.normal.to_array(), uv: v.uv }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
    pub env_params: [f32; 4],
}

impl GlobalsUniform {
    pub fn new(camera: &Camera, lights: &LightRig, has_environment: bool) -> Self {
        let view_proj = camera.view_proj();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).to_array(),
            ambient: (lights.ambient_color * lights.ambient_intensity).extend(1.0).to_array(),
            sun_dir: lights.sun_direction.extend(0.0).to_array(),
            sun_color: (lights.sun_color * lights.sun_intensity).extend(1.0).to_array(),
            sky_color: lights.sky_color.extend(lights.hemisphere_intensity).to_array(),
            ground_color: lights.ground_color.extend(1.0).to_array(),
            env_params: [if has_environment { 1.0 } else { 0.0 }, ENV_LIGHT_STRENGTH, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub params: [f32; 4],
}

impl ObjectUniform {
    fn new(model: Mat4, base_color: [f32; 4], alpha_cutoff: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            base_color,
            params: [alpha_cutoff, 0.0, 0.0, 0.0],
        }
    }
}

/// egui output for one frame, ready to draw.
pub struct EguiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

struct GpuPrimitive {
    node: usize,
    mesh: usize,
    primitive: usize,
    /// Skin to deform with; such primitives are rewritten every frame in
    /// world space.
    skin: Option<usize>,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    object_buffer: Buffer,
    bind_group: BindGroup,
    base_color: [f32; 4],
    alpha_cutoff: f32,
    double_sided: bool,
}

struct GpuModel {
    model: Arc<Model>,
    primitives: Vec<GpuPrimitive>,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn texture_2d(
    device: &Device,
    queue: &Queue,
    label: &str,
    width: u32,
    height: u32,
    format: TextureFormat,
    data: &[u8],
) -> TextureView {
    device
        .create_texture_with_data(
            queue,
            &TextureDescriptor {
                label: Some(label),
                size: Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format,
                usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
                view_formats: &[],
            },
            util::TextureDataOrder::LayerMajor,
            data,
        )
        .create_view(&TextureViewDescriptor::default())
}

fn upload_rgba8(device: &Device, queue: &Queue, label: &str, tex: &TextureData) -> TextureView {
    if tex.width == 0 || tex.height == 0 || tex.rgba.len() != (tex.width * tex.height * 4) as usize {
        warn!(label, "malformed texture, using white");
        return texture_2d(device, queue, label, 1, 1, TextureFormat::Rgba8UnormSrgb, &[255; 4]);
    }
    texture_2d(device, queue, label, tex.width, tex.height, TextureFormat::Rgba8UnormSrgb, &tex.rgba)
}

fn upload_environment(device: &Device, queue: &Queue, env: &EnvironmentMap) -> TextureView {
    texture_2d(
        device,
        queue,
        "environment",
        env.width,
        env.height,
        TextureFormat::Rgba16Float,
        bytemuck::cast_slice(&env.texels),
    )
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer { ty: BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None },
        count: None,
    }
}

fn texture_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Sampler(SamplerBindingType::Filtering),
        count: None,
    }
}

/// Everything on the GPU side: pipelines, per-primitive buffers and the
/// egui renderer. Fed from a [`SceneGraph`] each frame.
pub struct Renderer {
    mesh_pipeline: RenderPipeline,
    double_sided_pipeline: RenderPipeline,
    sky_pipeline: RenderPipeline,
    globals_buffer: Buffer,
    globals_layout: BindGroupLayout,
    globals_bind_group: BindGroup,
    object_layout: BindGroupLayout,
    linear_sampler: Sampler,
    white: TextureView,
    depth_view: TextureView,
    clear_color: Color,
    environment_loaded: bool,
    uploaded_revision: Option<u64>,
    models: HashMap<ModelSlot, GpuModel>,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(gpu: &GpuContext, clear: [f64; 4]) -> Self {
        let (device, queue, format) = (gpu.device.as_ref(), gpu.queue.as_ref(), gpu.format);
        let (width, height) = gpu.size();
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT), texture_entry(1), sampler_entry(2)],
        });
        let object_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT), texture_entry(1), sampler_entry(2)],
        });

        let globals_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let linear_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        let white = texture_2d(device, queue, "white", 1, 1, TextureFormat::Rgba8UnormSrgb, &[255; 4]);
        let black_env = texture_2d(device, queue, "environment_placeholder", 1, 1, TextureFormat::Rgba16Float, &[0; 8]);
        let globals_bind_group = Self::globals_bind_group(device, &globals_layout, &globals_buffer, &black_env, &linear_sampler);

        let mesh_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let sky_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("sky_pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = Self::mesh_pipeline(device, &mesh_layout, &shader, format, Some(Face::Back));
        let double_sided_pipeline = Self::mesh_pipeline(device, &mesh_layout, &shader, format, None);

        let sky_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&sky_layout),
            vertex: VertexState { module: &shader, entry_point: Some("vs_sky"), buffers: &[], compilation_options: Default::default() },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_sky"),
                targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
                compilation_options: Default::default(),
            }),
            primitive: PrimitiveState { topology: PrimitiveTopology::TriangleList, cull_mode: None, ..Default::default() },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: CompareFunction::Always,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        });

        let (_, depth_view) = create_depth_texture(device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            mesh_pipeline,
            double_sided_pipeline,
            sky_pipeline,
            globals_buffer,
            globals_layout,
            globals_bind_group,
            object_layout,
            linear_sampler,
            white,
            depth_view,
            clear_color: Color { r: clear[0], g: clear[1], b: clear[2], a: clear[3] },
            environment_loaded: false,
            uploaded_revision: None,
            models: HashMap::new(),
            egui_renderer,
        }
    }

    fn globals_bind_group(
        device: &Device,
        layout: &BindGroupLayout,
        buffer: &Buffer,
        env: &TextureView,
        sampler: &Sampler,
    ) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout,
            entries: &[
                BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() },
                BindGroupEntry { binding: 1, resource: BindingResource::TextureView(env) },
                BindGroupEntry { binding: 2, resource: BindingResource::Sampler(sampler) },
            ],
        })
    }

    fn mesh_pipeline(
        device: &Device,
        layout: &PipelineLayout,
        shader: &ShaderModule,
        format: TextureFormat,
        cull_mode: Option<Face>,
    ) -> RenderPipeline {
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(if cull_mode.is_some() { "mesh_pipeline" } else { "mesh_pipeline_double_sided" }),
            layout: Some(layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some("vs_mesh"),
                buffers: &[VertexBufferLayout {
                    array_stride: std::mem::size_of::<GpuVertex>() as BufferAddress,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &[
                        VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
                        VertexAttribute { offset: 12, shader_location: 1, format: VertexFormat::Float32x3 },
                        VertexAttribute { offset: 24, shader_location: 2, format: VertexFormat::Float32x2 },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(FragmentState {
                module: shader,
                entry_point: Some("fs_mesh"),
                targets: &[Some(ColorTargetState { format, blend: Some(BlendState::ALPHA_BLENDING), write_mask: ColorWrites::ALL })],
                compilation_options: Default::default(),
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        })
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    /// Uploads whatever the scene gained since the last call.
    pub fn sync(&mut self, device: &Device, queue: &Queue, scene: &SceneGraph) {
        if self.uploaded_revision == Some(scene.revision()) {
            return;
        }
        if let (false, Some(env)) = (self.environment_loaded, &scene.environment) {
            let view = upload_environment(device, queue, env);
            self.globals_bind_group =
                Self::globals_bind_group(device, &self.globals_layout, &self.globals_buffer, &view, &self.linear_sampler);
            self.environment_loaded = true;
            debug!(width = env.width, height = env.height, "environment uploaded");
        }
        for (slot, instance) in scene.instances() {
            let current = self.models.get(&slot).is_some_and(|m| Arc::ptr_eq(&m.model, &instance.model));
            if !current {
                let gpu_model = self.upload_model(device, queue, &instance.model);
                debug!(?slot, primitives = gpu_model.primitives.len(), "model uploaded");
                self.models.insert(slot, gpu_model);
            }
        }
        self.uploaded_revision = Some(scene.revision());
    }

    fn upload_model(&self, device: &Device, queue: &Queue, model: &Arc<Model>) -> GpuModel {
        let textures: Vec<TextureView> = model
            .textures
            .iter()
            .enumerate()
            .map(|(i, tex)| upload_rgba8(device, queue, &format!("{}_texture_{i}", model.label), tex))
            .collect();

        let mut primitives = Vec::new();
        for (node_idx, node) in model.nodes.iter().enumerate() {
            let Some(mesh_idx) = node.mesh else { continue };
            let Some(mesh) = model.meshes.get(mesh_idx) else { continue };
            for (prim_idx, prim) in mesh.primitives.iter().enumerate() {
                if prim.indices.is_empty() {
                    continue;
                }
                let material = prim.material.and_then(|m| model.materials.get(m)).cloned().unwrap_or_default();
                let texture = material.base_color_texture.and_then(|t| textures.get(t)).unwrap_or(&self.white);
                let skin = node.skin.filter(|_| prim.skin_weights.is_some());

                let vertices: Vec<GpuVertex> = prim.vertices.iter().map(GpuVertex::from).collect();
                let vertex_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
                    label: Some("vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
                });
                let index_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
                    label: Some("index_buffer"),
                    contents: bytemuck::cast_slice(&prim.indices),
                    usage: BufferUsages::INDEX,
                });
                let alpha_cutoff = if material.alpha_mode == AlphaMode::Mask { 0.5 } else { 0.0 };
                let object_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
                    label: Some("object_buffer"),
                    contents: bytemuck::bytes_of(&ObjectUniform::new(Mat4::IDENTITY, material.base_color, alpha_cutoff)),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&BindGroupDescriptor {
                    label: Some("object_bind_group"),
                    layout: &self.object_layout,
                    entries: &[
                        BindGroupEntry { binding: 0, resource: object_buffer.as_entire_binding() },
                        BindGroupEntry { binding: 1, resource: BindingResource::TextureView(texture) },
                        BindGroupEntry { binding: 2, resource: BindingResource::Sampler(&self.linear_sampler) },
                    ],
                });

                primitives.push(GpuPrimitive {
                    node: node_idx,
                    mesh: mesh_idx,
                    primitive: prim_idx,
                    skin,
                    vertex_buffer,
                    index_buffer,
                    index_count: prim.indices.len() as u32,
                    object_buffer,
                    bind_group,
                    base_color: material.base_color,
                    alpha_cutoff,
                    double_sided: material.double_sided,
                });
            }
        }
        GpuModel { model: Arc::clone(model), primitives }
    }

    /// Per-frame buffer writes: transforms and CPU-skinned vertices.
    fn update_instance(queue: &Queue, gpu_model: &GpuModel, instance: &ModelInstance) {
        let world = instance.world_matrices();
        for prim in &gpu_model.primitives {
            let Some(source) = instance.model.meshes.get(prim.mesh).and_then(|m| m.primitives.get(prim.primitive)) else {
                continue;
            };
            let transform = match prim.skin {
                Some(skin) => {
                    let skinned: Vec<GpuVertex> =
                        skin_vertices(source, &instance.joint_matrices(skin)).iter().map(GpuVertex::from).collect();
                    queue.write_buffer(&prim.vertex_buffer, 0, bytemuck::cast_slice(&skinned));
                    Mat4::IDENTITY
                }
                None => world.get(prim.node).copied().unwrap_or(Mat4::IDENTITY),
            };
            let uniform = ObjectUniform::new(transform, prim.base_color, prim.alpha_cutoff);
            queue.write_buffer(&prim.object_buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneGraph,
        camera: &Camera,
        ui: Option<EguiFrame>,
    ) -> Result<(), SurfaceError> {
        let (device, queue) = (gpu.device.as_ref(), gpu.queue.as_ref());
        let size = gpu.size();
        self.sync(device, queue, scene);

        let globals = GlobalsUniform::new(camera, &scene.lights, self.environment_loaded);
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        for (slot, instance) in scene.instances() {
            if let Some(gpu_model) = self.models.get(&slot) {
                Self::update_instance(queue, gpu_model, instance);
            }
        }

        let frame = gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(self.clear_color), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.globals_bind_group, &[]);
            if self.environment_loaded {
                rp.set_pipeline(&self.sky_pipeline);
                rp.draw(0..3, 0..1);
            }

            for (slot, _) in scene.instances() {
                let Some(gpu_model) = self.models.get(&slot) else { continue };
                for prim in &gpu_model.primitives {
                    rp.set_pipeline(if prim.double_sided { &self.double_sided_pipeline } else { &self.mesh_pipeline });
                    rp.set_bind_group(1, &prim.bind_group, &[]);
                    rp.set_vertex_buffer(0, prim.vertex_buffer.slice(..));
                    rp.set_index_buffer(prim.index_buffer.slice(..), IndexFormat::Uint32);
                    rp.draw_indexed(0..prim.index_count, 0, 0..1);
                }
            }
        }

        let mut command_buffers = Vec::new();
        if let Some(ui) = &ui {
            let screen_descriptor =
                egui_wgpu::ScreenDescriptor { size_in_pixels: [size.0, size.1], pixels_per_point: ui.pixels_per_point };
            for (id, image_delta) in &ui.textures_delta.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            command_buffers =
                self.egui_renderer.update_buffers(device, queue, &mut encoder, &ui.primitives, &screen_descriptor);

            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
        }

        command_buffers.push(encoder.finish());
        queue.submit(command_buffers);
        frame.present();

        if let Some(ui) = ui {
            for id in &ui.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::model::Viewport;
    use glam::Vec4;

    #[test]
    fn uniform_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<GpuVertex>(), 32);
        assert_eq!(std::mem::size_of::<GlobalsUniform>(), 240);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
    }

    #[test]
    fn globals_carry_light_rig() {
        let camera = Camera::new(&CameraConfig::default(), Viewport::new(800, 600));
        let lights = LightRig::default();
        let g = GlobalsUniform::new(&camera, &lights, false);
        assert_eq!(g.ambient[0], 0.5);
        assert_eq!(g.sky_color[3], 1.0);
        assert_eq!(g.env_params[0], 0.0);
        let inv = Mat4::from_cols_array_2d(&g.inv_view_proj) * Mat4::from_cols_array_2d(&g.view_proj);
        assert!(inv.abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = Mat4::from_scale(glam::Vec3::new(2.0, 1.0, 1.0));
        let u = ObjectUniform::new(m, [1.0; 4], 0.0);
        let n = Mat4::from_cols_array_2d(&u.normal) * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!((n.x - 0.5).abs() < 1e-6);
    }
}
