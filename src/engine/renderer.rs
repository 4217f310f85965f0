// Instanced scene renderer.
//
// Every mesh is uploaded once at startup. Each frame the caller hands over a
// draw list; draws are sorted by mesh, packed into one instance buffer, and
// each run of equal meshes becomes a single draw_indexed call.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::components::{Color, MeshHandle};
use super::mesh::{GpuVertex, RenderMesh};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// INSTANCE DATA (per-draw)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const V4: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix columns (locations 3..6)
                wgpu::VertexAttribute { offset: 0,      shader_location: 3, format: wgpu::VertexFormat::Float32x4 },
                wgpu::VertexAttribute { offset: V4,     shader_location: 4, format: wgpu::VertexFormat::Float32x4 },
                wgpu::VertexAttribute { offset: V4 * 2, shader_location: 5, format: wgpu::VertexFormat::Float32x4 },
                wgpu::VertexAttribute { offset: V4 * 3, shader_location: 6, format: wgpu::VertexFormat::Float32x4 },
                // Tint (location 7)
                wgpu::VertexAttribute { offset: V4 * 4, shader_location: 7, format: wgpu::VertexFormat::Float32x4 },
            ],
        }
    }
}

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    sun: [f32; 4],
    ambient: [f32; 4],
}

/// Scene-wide light setup.
#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    pub sky: Color,
    pub ambient: f32,
    /// Position of the directional light; it shines towards the origin.
    pub sun_position: Vec3,
    pub sun_intensity: f32,
}

/// One mesh instance to draw this frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub mesh: MeshHandle,
    pub model: Mat4,
    pub color: Color,
}

/// CPU meshes registered before the renderer exists.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: Vec<RenderMesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mesh: RenderMesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// Group draws by mesh. Returns (mesh, first instance, instance count) runs.
fn batch_draws(draws: &mut [DrawItem]) -> Vec<(MeshHandle, u32, u32)> {
    draws.sort_by_key(|d| d.mesh);
    let mut runs: Vec<(MeshHandle, u32, u32)> = Vec::new();
    for (i, draw) in draws.iter().enumerate() {
        match runs.last_mut() {
            Some((mesh, _, count)) if *mesh == draw.mesh => *count += 1,
            _ => runs.push((draw.mesh, i as u32, 1)),
        }
    }
    runs
}

pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    meshes: Vec<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    pub draw_calls: u32,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        library: &MeshLibrary,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("globals_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc(), InstanceData::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Mirrored weapon swings flip winding, so nothing is culled.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let meshes = library
            .meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| GpuMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Mesh {i} Vertices")),
                    contents: mesh.vertex_bytes(),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Mesh {i} Indices")),
                    contents: mesh.index_bytes(),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                num_indices: mesh.index_count() as u32,
            })
            .collect();

        let max_instances = 256;
        let instance_buffer = Self::create_instance_buffer(device, max_instances);
        let depth_view = Self::create_depth_view(device, config.width, config.height);

        log::info!("scene renderer ready: {} meshes", library.len());

        Self {
            pipeline,
            meshes,
            instance_buffer,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            draw_calls: 0,
        }
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = Self::create_depth_view(device, width, height);
    }

    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        view_proj: Mat4,
        lighting: &Lighting,
        draws: &mut [DrawItem],
    ) {
        let runs = batch_draws(draws);

        if draws.len() > self.max_instances {
            self.max_instances = draws.len().next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.max_instances);
            log::debug!("instance buffer grown to {}", self.max_instances);
        }

        // Write all buffers BEFORE the render pass
        let instance_data: Vec<InstanceData> = draws
            .iter()
            .map(|d| InstanceData { model: d.model.to_cols_array_2d(), color: d.color.to_rgba() })
            .collect();
        if !instance_data.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instance_data));
        }

        let sun = lighting.sun_position.normalize_or_zero();
        let globals = Globals {
            view_proj: view_proj.to_cols_array_2d(),
            sun: [sun.x, sun.y, sun.z, lighting.sun_intensity],
            ambient: [lighting.ambient, lighting.ambient, lighting.ambient, 0.0],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[globals]));

        let sky = lighting.sky;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: sky.r as f64,
                        g: sky.g as f64,
                        b: sky.b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        self.draw_calls = 0;
        for (mesh, first, count) in runs {
            let Some(gpu) = self.meshes.get(mesh.0 as usize) else {
                log::warn!("draw references unknown mesh {:?}", mesh);
                continue;
            };
            render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..gpu.num_indices, 0, first..first + count);
            self.draw_calls += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(mesh: u32) -> DrawItem {
        DrawItem { mesh: MeshHandle(mesh), model: Mat4::IDENTITY, color: Color::WHITE }
    }

    #[test]
    fn batches_runs_of_equal_meshes() {
        let mut draws = vec![item(2), item(0), item(2), item(1), item(0)];
        let runs = batch_draws(&mut draws);
        assert_eq!(
            runs,
            vec![(MeshHandle(0), 0, 2), (MeshHandle(1), 2, 1), (MeshHandle(2), 3, 2)]
        );
    }

    #[test]
    fn empty_draw_list_has_no_runs() {
        assert!(batch_draws(&mut []).is_empty());
    }
}
