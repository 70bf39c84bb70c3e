use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::PointLight;

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// A single point light plus the summed ambient term.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    decay: f32,
    /// Colour premultiplied with the intensity.
    colour: [f32; 3],
    // 0 when the scene has no point light
    enabled: u32,
    ambient: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
}

impl LightUniform {
    /// Darkness: no point light and no ambient contribution.
    pub fn unlit() -> Self {
        Self {
            position: [0.0; 3],
            decay: 0.0,
            colour: [0.0; 3],
            enabled: 0,
            ambient: [0.0; 3],
            _padding: 0,
        }
    }

    pub fn new(point: Option<(Vector3<f32>, &PointLight)>, ambient: [f32; 3]) -> Self {
        let mut uniform = Self {
            ambient,
            ..Self::unlit()
        };
        if let Some((position, light)) = point {
            uniform.position = position.into();
            uniform.decay = light.decay;
            uniform.colour = light.colour.map(|channel| channel * light.intensity);
            uniform.enabled = 1;
        }
        uniform
    }

    pub fn has_point_light(&self) -> bool {
        self.enabled != 0
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.ambient
    }
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Uploads `uniform` if it differs from what the GPU has.
    pub fn write(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_three_16_byte_rows() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }

    #[test]
    fn intensity_scales_the_point_colour() {
        let light = PointLight {
            colour: [1.0, 0.5, 0.0],
            intensity: 2.0,
            decay: 2.0,
        };
        let uniform = LightUniform::new(Some((Vector3::new(5.0, 5.0, 5.0), &light)), [0.1; 3]);
        assert!(uniform.has_point_light());
        assert_eq!(uniform.colour, [2.0, 1.0, 0.0]);
        assert_eq!(uniform.ambient(), [0.1; 3]);
        assert!(!LightUniform::new(None, [1.0; 3]).has_point_light());
    }
}
