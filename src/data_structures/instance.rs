//! Instance transformation data for GPU rendering.
//!
//! Every entity in the scene owns an [`Instance`]: position, Euler rotation and
//! scale. Entities sharing geometry and material are packed into one GPU buffer
//! of [`InstanceRaw`] and drawn with a single instanced call.

use std::f32::consts::TAU;

use cgmath::{Euler, Matrix, Rad, SquareMatrix, Vector3};

use crate::data_structures::model;

/// Per-instance transformation: position, rotation (XYZ Euler angles) and scale.
///
/// Rotation is kept as three angles because the scene animates each axis
/// independently. Angles are wrapped into `[0, 2π)` on every update so long
/// running sessions don't lose precision.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Adds `delta` to every rotation axis and wraps the result modulo a full turn.
    pub fn rotate(&mut self, delta: Vector3<f32>) {
        self.rotation = Vector3::new(
            normalize_angle(self.rotation.x + delta.x),
            normalize_angle(self.rotation.y + delta.y),
            normalize_angle(self.rotation.z + delta.z),
        );
    }

    pub fn euler(&self) -> Euler<Rad<f32>> {
        Euler::new(
            Rad(self.rotation.x),
            Rad(self.rotation.y),
            Rad(self.rotation.z),
        )
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.euler())
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let model = self.to_matrix();
        // Normals need the inverse transpose once scale is non-uniform.
        let linear = cgmath::Matrix3::from_cols(
            model.x.truncate(),
            model.y.truncate(),
            model.z.truncate(),
        );
        let normal = linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear);
        InstanceRaw {
            model: model.into(),
            normal: normal.into(),
        }
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * Stride layout: the model matrix as four vec4 followed by the normal matrix as three vec3.
 * Locations start at 5 so they never collide with `ModelVertex`.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Only advance to the next element once per instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_past_a_full_turn() {
        let mut instance = Instance::new();
        instance.rotate(Vector3::new(TAU + 0.5, 0.25, -0.5));
        assert!((instance.rotation.x - 0.5).abs() < 1e-5);
        assert!((instance.rotation.y - 0.25).abs() < 1e-6);
        assert!((instance.rotation.z - (TAU - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn normalized_angles_stay_in_range() {
        for angle in [-100.0, -TAU, -1e-9, 0.0, 3.0, TAU, 1e4] {
            let wrapped = normalize_angle(angle);
            assert!((0.0..TAU).contains(&wrapped), "{angle} -> {wrapped}");
        }
    }

    #[test]
    fn identity_instance_has_identity_matrix() {
        assert_eq!(Instance::new().to_matrix(), cgmath::Matrix4::identity());
    }

    #[test]
    fn translation_ends_up_in_last_column() {
        let instance = Instance::from(Vector3::new(-10.0, 0.0, 30.0));
        let matrix = instance.to_matrix();
        assert_eq!(matrix.w.truncate(), Vector3::new(-10.0, 0.0, 30.0));
    }
}
