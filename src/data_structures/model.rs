//! Vertices, meshes and materials.
//!
//! CPU-side descriptors ([`Material`]) live in the scene. Their GPU
//! counterparts ([`GpuMesh`], [`GpuMaterial`]) are created lazily by the
//! renderer and shared by every entity pointing at the same geometry/material.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{geometry::GeometryData, texture::Texture},
    resources::texture::TextureId,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    /// Multiplied with the material colour; white for everything but helpers.
    pub colour: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Surface appearance of a mesh.
///
/// `lit` materials are shaded by the scene lights (the standard material),
/// unlit ones show their colour/map as is (the basic material). A `map` that
/// isn't loaded yet is replaced by a white placeholder, so the mesh shows its
/// flat colour until the image arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub colour: [f32; 3],
    pub map: Option<TextureId>,
    pub wireframe: bool,
    pub lit: bool,
}

impl Material {
    pub fn standard(name: &str, colour: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            colour,
            map: None,
            wireframe: false,
            lit: true,
        }
    }

    pub fn basic(name: &str, colour: [f32; 3]) -> Self {
        Self {
            lit: false,
            ..Self::standard(name, colour)
        }
    }

    pub fn with_map(mut self, map: TextureId) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    /// The texture this material should sample right now.
    pub fn binding(&self, is_loaded: impl Fn(TextureId) -> bool) -> MapBinding {
        match self.map {
            Some(map) if is_loaded(map) => MapBinding::Loaded,
            _ => MapBinding::Placeholder,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            colour: [self.colour[0], self.colour[1], self.colour[2], 1.0],
            lit: self.lit as u32,
            _padding: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    colour: [f32; 4],
    lit: u32,
    // Uniforms are laid out in 16 byte blocks
    _padding: [u32; 3],
}

/// Geometry uploaded to the GPU, with both triangle and line index buffers.
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub line_index_buffer: wgpu::Buffer,
    pub num_line_elements: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, name: &str, data: &GeometryData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let lines = data.line_indices();
        let line_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Line Index Buffer", name)),
            contents: bytemuck::cast_slice(&lines),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices.len() as u32,
            line_index_buffer,
            num_line_elements: lines.len() as u32,
        }
    }
}

/// Which texture a [`GpuMaterial`]'s bind group currently samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapBinding {
    Placeholder,
    Loaded,
}

pub struct GpuMaterial {
    pub name: String,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub binding: MapBinding,
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        material: &Material,
        texture: &Texture,
        binding: MapBinding,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", material.name)),
            contents: bytemuck::cast_slice(&[material.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = mk_material_bind_group(device, layout, &material.name, texture, &buffer);
        Self {
            name: material.name.clone(),
            buffer,
            bind_group,
            binding,
        }
    }

    /// Swaps the sampled texture, e.g. once a pending map finished loading.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
        binding: MapBinding,
    ) {
        self.bind_group = mk_material_bind_group(device, layout, &self.name, texture, &self.buffer);
        self.binding = binding;
    }
}

fn mk_material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    texture: &Texture,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    let fallback_sampler;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback_sampler = crate::data_structures::texture::create_default_sampler(device);
            &fallback_sampler
        }
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some(name),
    })
}

pub trait DrawMesh<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a GpuMesh,
        material: &'a GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_lines_instanced(
        &mut self,
        mesh: &'a GpuMesh,
        material: &'a GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b GpuMesh,
        material: &'b GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_lines_instanced(
        &mut self,
        mesh: &'b GpuMesh,
        material: &'b GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.line_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_line_elements, 0, instances);
    }
}
