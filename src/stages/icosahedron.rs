use std::sync::Arc;

use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::core::{CameraBinding, GpuContext, RenderStage, TargetSpec, Viewport};

/// Instanced icosahedron field drawn through the shared camera uniform.
///
/// Twelve golden-ratio vertices, twenty flat-shaded faces, repeated over a
/// configurable 3D lattice centred on the origin.
pub struct IcosahedronLatticeStage {
    dims: [u32; 3],
    spacing: u32,
    resources: Option<Resources>,
}

struct Resources {
    gpu: Arc<GpuContext>,
    vertex_buffer: wgpu::Buffer,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    clears_target: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct LatticeInfo {
    dims: [i32; 3],
    spacing: i32,
}

const FACE_COUNT: u32 = 20;
const VERTICES_PER_FACE: u32 = 3;

impl IcosahedronLatticeStage {
    pub fn new(dims: [u32; 3], spacing: u32) -> Self {
        Self {
            dims,
            spacing,
            resources: None,
        }
    }

    fn instance_count(&self) -> u32 {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Unindexed `[position vec4, face normal vec4]` vertex stream, one
    /// normal per face so the shading stays faceted.
    fn build_vertices() -> Vec<f32> {
        let phi = (5.0f32.sqrt() + 1.0) / 2.0;

        let vertices: [[f32; 4]; 12] = [
            [1.0, 0.0, phi, 1.0],
            [1.0, 0.0, -phi, 1.0],
            [-1.0, 0.0, phi, 1.0],
            [-1.0, 0.0, -phi, 1.0],
            [phi, 1.0, 0.0, 1.0],
            [-phi, 1.0, 0.0, 1.0],
            [phi, -1.0, 0.0, 1.0],
            [-phi, -1.0, 0.0, 1.0],
            [0.0, phi, 1.0, 1.0],
            [0.0, phi, -1.0, 1.0],
            [0.0, -phi, 1.0, 1.0],
            [0.0, -phi, -1.0, 1.0],
        ];

        #[rustfmt::skip]
        let indices: [usize; 60] = [
            0, 2, 8,
            0, 8, 4,
            0, 4, 6,
            0, 6, 10,
            0, 10, 2,

            3, 1, 9,
            3, 9, 5,
            3, 5, 7,
            3, 7, 11,
            3, 11, 1,

            8, 9, 4,
            4, 9, 1,
            6, 4, 1,
            11, 6, 1,
            11, 10, 6,
            11, 7, 10,
            10, 7, 2,
            2, 7, 5,
            8, 2, 5,
            9, 8, 5,
        ];

        let mut stream = Vec::with_capacity(indices.len() * 8);
        for face in indices.chunks(3) {
            let (a, b, c) = (vertices[face[0]], vertices[face[1]], vertices[face[2]]);
            let normal = face_normal(a, b, c);
            for v in [a, b, c] {
                stream.extend_from_slice(&v);
                stream.extend_from_slice(&normal);
            }
        }
        stream
    }

    fn create_depth_view(gpu: &GpuContext, size: Viewport) -> wgpu::TextureView {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Lattice Depth Texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth24Plus,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

/// Flat-shading normal: the face centroid direction, which for a regular
/// icosahedron centred on the origin coincides with the face normal.
fn face_normal(a: [f32; 4], b: [f32; 4], c: [f32; 4]) -> [f32; 4] {
    let x = a[0] + b[0] + c[0];
    let y = a[1] + b[1] + c[1];
    let z = a[2] + b[2] + c[2];
    let len = (x * x + y * y + z * z).sqrt();
    [x / len, y / len, z / len, 1.0]
}

impl RenderStage for IcosahedronLatticeStage {
    fn on_resize(&mut self, size: Viewport) {
        if let Some(resources) = &mut self.resources {
            resources.depth_view = Self::create_depth_view(&resources.gpu, size);
        }
    }

    fn init(
        &mut self,
        gpu: &Arc<GpuContext>,
        camera: Option<&CameraBinding>,
        target: TargetSpec,
        clears_target: bool,
    ) -> Result<()> {
        let camera = camera.ok_or_else(|| anyhow::anyhow!("lattice stage needs the camera binding"))?;
        let device = gpu.device();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Icosahedron Vertex Buffer"),
            contents: bytemuck::cast_slice(&Self::build_vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let lattice_info = LatticeInfo {
            dims: [
                self.dims[0] as i32,
                self.dims[1] as i32,
                self.dims[2] as i32,
            ],
            spacing: self.spacing as i32,
        };
        let lattice_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lattice Info Buffer"),
            contents: bytemuck::bytes_of(&lattice_info),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lattice Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lattice Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lattice_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lattice Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../shaders/icosahedron_lattice.wgsl").into(),
            ),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lattice Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lattice Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 32,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 16,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = Self::create_depth_view(gpu, target.size);

        self.resources = Some(Resources {
            gpu: gpu.clone(),
            vertex_buffer,
            pipeline,
            bind_group,
            depth_view,
            clears_target,
        });

        log::debug!(
            "lattice stage ready: {}x{}x{} instances at spacing {}",
            self.dims[0],
            self.dims[1],
            self.dims[2],
            self.spacing
        );
        Ok(())
    }

    fn pre_pass(&mut self) -> Result<()> {
        Ok(())
    }

    fn make_pass(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let Some(resources) = &self.resources else {
            return;
        };

        let load = if resources.clears_target {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lattice Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &resources.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&resources.pipeline);
        render_pass.set_bind_group(0, &resources.bind_group, &[]);
        render_pass.set_vertex_buffer(0, resources.vertex_buffer.slice(..));
        render_pass.draw(0..FACE_COUNT * VERTICES_PER_FACE, 0..self.instance_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stream_covers_every_face() {
        let stream = IcosahedronLatticeStage::build_vertices();
        // 20 faces, 3 vertices each, 8 floats per vertex
        assert_eq!(stream.len(), 20 * 3 * 8);
    }

    #[test]
    fn face_normals_are_unit_length() {
        let stream = IcosahedronLatticeStage::build_vertices();
        for vertex in stream.chunks(8) {
            let n = &vertex[4..7];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn positions_lie_on_the_icosahedron_shell() {
        let phi = (5.0f32.sqrt() + 1.0) / 2.0;
        let radius = (1.0 + phi * phi).sqrt();

        let stream = IcosahedronLatticeStage::build_vertices();
        for vertex in stream.chunks(8) {
            let p = &vertex[0..3];
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((len - radius).abs() < 1e-5);
            assert_eq!(vertex[3], 1.0);
        }
    }

    #[test]
    fn instance_count_is_lattice_volume() {
        let stage = IcosahedronLatticeStage::new([4, 5, 6], 30);
        assert_eq!(stage.instance_count(), 120);
    }
}
