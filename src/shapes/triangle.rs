// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector3f };

/// Indexed triangle. `vertex`, `normal` and `texcoord` index the owning
/// mesh's buffers; `face_normal` and `area` are derived from the vertex
/// positions by `compute_geometry`.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub vertex: [usize; 3],
    pub normal: [usize; 3],
    pub texcoord: [usize; 3],
    pub face_normal: Vector3f,
    pub area: Float,
    pub group: usize,
}

impl Triangle {
    pub fn new(vertex: [usize; 3], normal: [usize; 3], texcoord: [usize; 3], group: usize) -> Self {
        Triangle {
            vertex,
            normal,
            texcoord,
            face_normal: Vector3f::new(0.0, 0.0, 1.0),
            area: 0.0,
            group,
        }
    }

    pub fn positions(&self, vertices: &[Vector3f]) -> (Vector3f, Vector3f, Vector3f) {
        (vertices[self.vertex[0]], vertices[self.vertex[1]], vertices[self.vertex[2]])
    }

    /// Recomputes area and unit face normal. Degenerate triangles get zero
    /// area and keep a +z normal.
    pub fn compute_geometry(&mut self, vertices: &[Vector3f]) {
        let (p0, p1, p2) = self.positions(vertices);
        let cross = (p1 - p0).cross(&(p2 - p0));
        self.area = 0.5 * cross.norm();
        self.face_normal = cross.try_normalize(0.0).unwrap_or_else(|| Vector3f::new(0.0, 0.0, 1.0));
    }
}
