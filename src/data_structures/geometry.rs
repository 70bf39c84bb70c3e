//! Shape descriptors and their tessellation.
//!
//! A [`Geometry`] is the immutable description of a shape (torus, box, sphere,
//! grid). [`Geometry::tessellate`] turns it into CPU-side vertex and index data
//! which the renderer uploads once per geometry and shares between all meshes
//! referring to it.

use std::{collections::HashSet, f32::consts::PI};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::model::ModelVertex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Square grid of lines on the XZ plane, centred at the origin.
    Grid {
        size: f32,
        divisions: u32,
        centre_colour: [f32; 3],
        line_colour: [f32; 3],
    },
}

/// Tessellated geometry ready to be uploaded.
#[derive(Clone, Debug)]
pub struct GeometryData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    pub fn topology(&self) -> Topology {
        match self {
            Geometry::Grid { .. } => Topology::Lines,
            _ => Topology::Triangles,
        }
    }

    pub fn tessellate(&self) -> GeometryData {
        let (vertices, indices) = match *self {
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(radius, tube, radial_segments.max(3), tubular_segments.max(3)),
            Geometry::Box {
                width,
                height,
                depth,
            } => cuboid(width, height, depth),
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments.max(3), height_segments.max(2)),
            Geometry::Grid {
                size,
                divisions,
                centre_colour,
                line_colour,
            } => grid(size, divisions.max(1), centre_colour, line_colour),
        };
        GeometryData {
            vertices,
            indices,
            topology: self.topology(),
        }
    }
}

impl GeometryData {
    /// Index list to draw this geometry with lines.
    ///
    /// Line geometry is returned as is. Triangle geometry is turned into its
    /// unique edges, which is what a wireframe material shows.
    pub fn line_indices(&self) -> Vec<u32> {
        if self.topology == Topology::Lines {
            return self.indices.clone();
        }
        let mut seen = HashSet::new();
        let mut lines = Vec::with_capacity(self.indices.len() * 2);
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                let edge = if a < b { (a, b) } else { (b, a) };
                if seen.insert(edge) {
                    lines.push(edge.0);
                    lines.push(edge.1);
                }
            }
        }
        lines
    }
}

fn vertex(position: Vector3<f32>, normal: Vector3<f32>, uv: [f32; 2]) -> ModelVertex {
    ModelVertex {
        position: position.into(),
        tex_coords: uv,
        normal: normal.into(),
        colour: [1.0; 3],
    }
}

fn torus(radius: f32, tube: f32, radial: u32, tubular: u32) -> (Vec<ModelVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * 2.0 * PI;
            let v = j as f32 / radial as f32 * 2.0 * PI;
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let centre = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - centre).normalize();
            let uv = [i as f32 / tubular as f32, j as f32 / radial as f32];
            vertices.push(vertex(position, normal, uv));
        }
    }

    let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    (vertices, indices)
}

fn sphere(radius: f32, width: u32, height: u32) -> (Vec<ModelVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((width + 1) * (height + 1)) as usize);
    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let position = Vector3::new(
                -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            // a zero radius leaves no direction to normalize
            let normal = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                Vector3::new(0.0, 1.0, 0.0)
            };
            vertices.push(vertex(position, normal, [u, 1.0 - v]));
        }
    }

    let row = width + 1;
    let mut indices = Vec::new();
    for iy in 0..height {
        for ix in 0..width {
            let a = row * iy + ix + 1;
            let b = row * iy + ix;
            let c = row * (iy + 1) + ix;
            let d = row * (iy + 1) + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    (vertices, indices)
}

fn cuboid(width: f32, height: f32, depth: f32) -> (Vec<ModelVertex>, Vec<u32>) {
    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
    // (normal, u axis, v axis) per face; corners are centre ± u ± v
    let faces = [
        (Vector3::unit_x(), -Vector3::unit_z() * hd, Vector3::unit_y() * hh, hw),
        (-Vector3::unit_x(), Vector3::unit_z() * hd, Vector3::unit_y() * hh, hw),
        (Vector3::unit_y(), Vector3::unit_x() * hw, -Vector3::unit_z() * hd, hh),
        (-Vector3::unit_y(), Vector3::unit_x() * hw, Vector3::unit_z() * hd, hh),
        (Vector3::unit_z(), Vector3::unit_x() * hw, Vector3::unit_y() * hh, hd),
        (-Vector3::unit_z(), -Vector3::unit_x() * hw, Vector3::unit_y() * hh, hd),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v, distance) in faces {
        let centre = normal * distance;
        let base = vertices.len() as u32;
        vertices.push(vertex(centre - u + v, normal, [0.0, 0.0]));
        vertices.push(vertex(centre + u + v, normal, [1.0, 0.0]));
        vertices.push(vertex(centre - u - v, normal, [0.0, 1.0]));
        vertices.push(vertex(centre + u - v, normal, [1.0, 1.0]));
        // counter-clockwise seen from outside
        indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
    }
    (vertices, indices)
}

fn grid(
    size: f32,
    divisions: u32,
    centre_colour: [f32; 3],
    line_colour: [f32; 3],
) -> (Vec<ModelVertex>, Vec<u32>) {
    let half = size / 2.0;
    let step = size / divisions as f32;
    let centre = divisions / 2;
    let up = Vector3::unit_y();

    let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let colour = if i == centre {
            centre_colour
        } else {
            line_colour
        };
        for position in [
            Vector3::new(-half, 0.0, k),
            Vector3::new(half, 0.0, k),
            Vector3::new(k, 0.0, -half),
            Vector3::new(k, 0.0, half),
        ] {
            vertices.push(ModelVertex {
                colour,
                ..vertex(position, up, [0.0, 0.0])
            });
        }
    }
    let indices = (0..vertices.len() as u32).collect();
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_has_a_vertex_per_ring_and_segment() {
        let data = Geometry::Torus {
            radius: 10.0,
            tube: 3.0,
            radial_segments: 16,
            tubular_segments: 100,
        }
        .tessellate();
        assert_eq!(data.vertices.len(), 17 * 101);
        assert_eq!(data.indices.len(), 16 * 100 * 6);
        for v in &data.vertices {
            let p = Vector3::from(v.position);
            let ring = (p.x * p.x + p.y * p.y).sqrt();
            // distance from the tube centre line must equal the tube radius
            let d = ((ring - 10.0).powi(2) + p.z * p.z).sqrt();
            assert!((d - 3.0).abs() < 1e-3, "{d}");
        }
    }

    #[test]
    fn sphere_vertices_lie_on_the_surface() {
        let data = Geometry::Sphere {
            radius: 3.0,
            width_segments: 32,
            height_segments: 32,
        }
        .tessellate();
        assert_eq!(data.vertices.len(), 33 * 33);
        // the pole rows contribute one triangle per segment instead of two
        assert_eq!(data.indices.len(), (32 * 32 * 2 - 2 * 32) * 3);
        for v in &data.vertices {
            assert!((Vector3::from(v.position).magnitude() - 3.0).abs() < 1e-4);
        }
        assert!(data.indices.iter().all(|&i| (i as usize) < data.vertices.len()));
    }

    #[test]
    fn box_has_six_quads_within_its_extent() {
        let data = Geometry::Box {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        }
        .tessellate();
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
        for v in &data.vertices {
            assert!(v.position.iter().all(|c| c.abs() <= 1.5 + f32::EPSILON));
            assert!(v.position.iter().any(|c| (c.abs() - 1.5).abs() < 1e-6));
        }
    }

    #[test]
    fn box_faces_wind_outwards() {
        let data = Geometry::Box {
            width: 2.0,
            height: 2.0,
            depth: 2.0,
        }
        .tessellate();
        for tri in data.indices.chunks_exact(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| Vector3::from(data.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let stored = Vector3::from(data.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(stored) > 0.0);
        }
    }

    #[test]
    fn grid_is_drawn_with_lines_and_a_darker_centre() {
        let centre = [0.25; 3];
        let line = [0.5; 3];
        let data = Geometry::Grid {
            size: 200.0,
            divisions: 50,
            centre_colour: centre,
            line_colour: line,
        }
        .tessellate();
        assert_eq!(data.topology, Topology::Lines);
        assert_eq!(data.vertices.len(), 51 * 4);
        assert_eq!(data.line_indices(), data.indices);
        let centre_lines = data.vertices.iter().filter(|v| v.colour == centre).count();
        assert_eq!(centre_lines, 4);
        assert!(data
            .vertices
            .iter()
            .all(|v| v.position[0].abs() <= 100.0 && v.position[2].abs() <= 100.0));
    }

    #[test]
    fn wireframe_edges_are_unique() {
        let data = Geometry::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
        .tessellate();
        let lines = data.line_indices();
        // 4 border edges + 1 diagonal per face
        assert_eq!(lines.len(), 6 * 5 * 2);
    }
}
