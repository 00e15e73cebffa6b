use bytemuck::Zeroable;
use folio_io::Model;
use wgpu::util::DeviceExt;

use super::backend::{RenderBackend, pixel_size};
use super::camera::PerspectiveCamera;
use super::scene::Scene;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
/// Colour and depth attachments are multisampled; the colour resolves into the shown texture.
const SAMPLE_COUNT: u32 = 4;

const SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model_offset: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = in.position + uniforms.model_offset.xyz;
    out.position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.normal = in.normal;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let diffuse = max(dot(n, normalize(uniforms.light_dir.xyz)), 0.0);
    let light = uniforms.ambient.rgb + uniforms.light_color.rgb * diffuse;
    return vec4<f32>(in.color.rgb * light, in.color.a);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model_offset: [f32; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct RenderTarget {
    size: [u32; 2],
    view: wgpu::TextureView,
    msaa: wgpu::TextureView,
    depth: wgpu::TextureView,
}

/// Draws the scene into an offscreen sRGB texture that the UI shows as an image.
pub struct SceneRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    target: RenderTarget,
    target_revision: u64,
    meshes: Vec<GpuMesh>,
    model_offset: [f32; 3],
    pixel_ratio: f32,
    size: [f32; 2],
}

impl SceneRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("folio_scene_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("folio_scene_bind_group_layout"),
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
        });

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("folio_scene_uniforms"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("folio_scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("folio_scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("folio_scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
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
                count: SAMPLE_COUNT,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let target = RenderTarget::new(&device, [1, 1]);
        Self {
            device,
            queue,
            pipeline,
            uniforms,
            bind_group,
            target,
            target_revision: 0,
            meshes: Vec::new(),
            model_offset: [0.0; 3],
            pixel_ratio: 1.0,
            size: [1.0, 1.0],
        }
    }

    pub fn target_view(&self) -> &wgpu::TextureView {
        &self.target.view
    }

    /// Bumped whenever the target texture is recreated.
    pub fn target_revision(&self) -> u64 {
        self.target_revision
    }

    fn ensure_target(&mut self) {
        let size = pixel_size(self.size[0], self.size[1], self.pixel_ratio);
        if self.target.size != size {
            self.target = RenderTarget::new(&self.device, size);
            self.target_revision = self.target_revision.wrapping_add(1);
        }
    }
}

impl RenderBackend for SceneRenderer {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
        self.ensure_target();
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.size = [width, height];
        self.ensure_target();
    }

    fn buffer_size(&self) -> [u32; 2] {
        self.target.size
    }

    fn upload_model(&mut self, model: &Model) {
        self.meshes = model
            .meshes()
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| {
                let vertices: Vec<Vertex> = mesh
                    .positions
                    .iter()
                    .zip(&mesh.normals)
                    .map(|(position, normal)| Vertex {
                        position: *position,
                        normal: *normal,
                        color: mesh.base_color,
                    })
                    .collect();
                GpuMesh {
                    vertices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("folio_mesh_vertices"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("folio_mesh_indices"),
                        contents: bytemuck::cast_slice(&mesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mesh.indices.len() as u32,
                }
            })
            .collect();
        let position = model.position();
        self.model_offset = [position.x, position.y, position.z];
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> bool {
        let ambient = scene.ambient();
        let directional = scene.directional();
        let ambient_rgb = scale_rgb(ambient.color.to_linear(), ambient.intensity);
        let light_rgb = scale_rgb(directional.color.to_linear(), directional.intensity);
        let light_dir = directional.direction_to_light();
        let uniforms = Uniforms {
            view_proj: camera.view_projection().into(),
            model_offset: [
                self.model_offset[0],
                self.model_offset[1],
                self.model_offset[2],
                0.0,
            ],
            ambient: [ambient_rgb[0], ambient_rgb[1], ambient_rgb[2], 1.0],
            light_dir: [light_dir.x, light_dir.y, light_dir.z, 0.0],
            light_color: [light_rgb[0], light_rgb[1], light_rgb[2], 1.0],
        };
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let [r, g, b] = scene.background().to_linear();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("folio_scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("folio_scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.msaa,
                    depth_slice: None,
                    resolve_target: Some(&self.target.view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            for mesh in &self.meshes {
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        true
    }
}

impl RenderTarget {
    fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        let [resolve, msaa, depth] = attachment_descriptors(size);
        let view = |descriptor: &wgpu::TextureDescriptor| {
            device
                .create_texture(descriptor)
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        Self {
            size,
            view: view(&resolve),
            msaa: view(&msaa),
            depth: view(&depth),
        }
    }
}

/// Resolve, multisampled colour and depth textures for one target size.
fn attachment_descriptors(size: [u32; 2]) -> [wgpu::TextureDescriptor<'static>; 3] {
    let extent = wgpu::Extent3d {
        width: size[0].max(1),
        height: size[1].max(1),
        depth_or_array_layers: 1,
    };
    let texture = |label: &'static str,
                   sample_count: u32,
                   format: wgpu::TextureFormat,
                   usage: wgpu::TextureUsages| wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    };
    [
        texture(
            "folio_scene_color",
            1,
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        ),
        texture(
            "folio_scene_color_msaa",
            SAMPLE_COUNT,
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ),
        texture(
            "folio_scene_depth",
            SAMPLE_COUNT,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ),
    ]
}

fn scale_rgb(rgb: [f32; 3], intensity: f32) -> [f32; 3] {
    [rgb[0] * intensity, rgb[1] * intensity, rgb[2] * intensity]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multisampled_attachments_resolve_into_sampled_texture() {
        let [resolve, msaa, depth] = attachment_descriptors([640, 0]);
        assert_eq!(resolve.sample_count, 1);
        assert!(resolve.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert_eq!(msaa.sample_count, SAMPLE_COUNT);
        assert_eq!(depth.sample_count, SAMPLE_COUNT);
        assert_eq!(msaa.format, resolve.format);
        for descriptor in [&resolve, &msaa, &depth] {
            assert_eq!(descriptor.size.width, 640);
            assert_eq!(descriptor.size.height, 1);
        }
    }
}
