//! Mesh generation utilities

use genview_assets::MeshPrimitive;
use glam::Vec3;
use std::f32::consts::PI;

use crate::bounds::Aabb;
use crate::vertex::Vertex3D;

/// How the index list is assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Generated mesh data
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    /// Bounds of the vertex positions in mesh space
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    /// Convert a loaded glTF primitive.
    ///
    /// Missing normals default to +Y and missing vertex colors to `color`;
    /// non-indexed primitives get a sequential index list.
    pub fn from_primitive(primitive: &MeshPrimitive, color: [f32; 4]) -> Self {
        let vertex_count = primitive.positions.len();
        let has_normals = primitive.normals.len() == vertex_count;
        let colors = primitive
            .colors
            .as_ref()
            .filter(|c| c.len() == vertex_count);

        let vertices = primitive
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let normal = if has_normals {
                    primitive.normals[i]
                } else {
                    [0.0, 1.0, 0.0]
                };
                let color = colors.map_or(color, |c| c[i]);
                Vertex3D::new(*position, normal, color)
            })
            .collect();

        let indices = match &primitive.indices {
            Some(indices) => indices.clone(),
            None => (0..vertex_count as u32).collect(),
        };

        Self {
            vertices,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// Generate a UV sphere mesh
    pub fn sphere(radius: f32, segments: u32, rings: u32, color: [f32; 4]) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = radius * phi.cos();
            let ring_radius = radius * phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let normal = Vec3::new(x, y, z).normalize_or_zero();

                vertices.push(Vertex3D::new(
                    [x, y, z],
                    [normal.x, normal.y, normal.z],
                    color,
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self {
            vertices,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// Generate a square line grid on the XZ plane, centered on the origin.
    /// The two center lines use `center_color`.
    pub fn grid(size: f32, divisions: u32, center_color: [f32; 4], color: [f32; 4]) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let half_size = size / 2.0;
        let step = size / divisions as f32;
        let center = divisions / 2;

        for i in 0..=divisions {
            let offset = -half_size + i as f32 * step;
            let line_color = if i == center { center_color } else { color };

            for (start, end) in [
                ([-half_size, 0.0, offset], [half_size, 0.0, offset]),
                ([offset, 0.0, -half_size], [offset, 0.0, half_size]),
            ] {
                let base = vertices.len() as u32;
                vertices.push(Vertex3D::new(start, [0.0, 1.0, 0.0], line_color));
                vertices.push(Vertex3D::new(end, [0.0, 1.0, 0.0], line_color));
                indices.push(base);
                indices.push(base + 1);
            }
        }

        Self {
            vertices,
            indices,
            topology: Topology::Lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_bounds() {
        let sphere = Mesh::sphere(1.0, 32, 32, [1.0; 4]);
        assert_eq!(sphere.vertices.len(), 33 * 33);
        assert_eq!(sphere.indices.len(), 32 * 32 * 6);

        let bounds = sphere.bounds();
        assert!((bounds.max_extent() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_grid_lines() {
        let grid = Mesh::grid(10.0, 20, [0.5; 4], [0.9; 4]);
        assert_eq!(grid.topology, Topology::Lines);
        assert_eq!(grid.indices.len(), 21 * 4);
        assert_eq!(grid.bounds().size(), Vec3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn test_primitive_without_normals_or_indices() {
        let primitive = MeshPrimitive {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            tex_coords: None,
            colors: None,
            indices: None,
            material: None,
        };
        let mesh = Mesh::from_primitive(&primitive, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[2].color, [0.2, 0.4, 0.6, 1.0]);
    }
}
