// Copyright @yucwang 2023

use super::triangle::Triangle;

use crate::core::rng::LcgRng;
use crate::materials::material::{Material, DEFAULT_MATERIAL};
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::samplers::area_weighted::AreaWeightedSampler;
use crate::textures::filter::FilterMode;
use crate::textures::store::TextureStore;

use std::collections::HashMap;
use std::thread;
use std::vec::Vec;

// Below this many triangles the metric pass stays on the calling thread.
const PARALLEL_METRICS_THRESHOLD: usize = 4096;

/// Contiguous run `[start, start + length)` of triangles sharing a material.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleGroup {
    pub start: usize,
    pub length: usize,
    pub material: String,
}

impl TriangleGroup {
    pub fn new(start: usize, length: usize, material: &str) -> Self {
        Self { start, length, material: material.to_string() }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.length
    }
}

/// Point drawn on the surface by `TriangleMesh::sample_area_weighted`.
#[derive(Clone, Debug)]
pub struct SurfaceSample {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub triangle: usize,
    pub pdf: Float,
}

pub struct TriangleMesh {
    name: String,
    vertices: Vec<Vector3f>,
    normals:  Vec<Vector3f>,
    texcoords: Vec<Vector2f>,
    triangles: Vec<Triangle>,
    groups: Vec<TriangleGroup>,
    materials: HashMap<String, Material>,
    default_material: Material,
    total_area: Float,
    bounds: AABB,
    distribution: AreaWeightedSampler,
}

impl TriangleMesh {
    /// Assembles a mesh from loader output and computes its metrics.
    ///
    /// Fails if any triangle index falls outside its buffer or the groups do
    /// not partition the triangle list in order.
    pub fn new(
        name: &str,
        vertices: Vec<Vector3f>,
        normals: Vec<Vector3f>,
        texcoords: Vec<Vector2f>,
        triangles: Vec<Triangle>,
        groups: Vec<TriangleGroup>,
        mut materials: HashMap<String, Material>,
    ) -> std::result::Result<Self, String> {
        let default_material = materials.remove(DEFAULT_MATERIAL).unwrap_or_default();

        let mut mesh = Self {
            name: name.to_string(),
            vertices,
            normals,
            texcoords,
            triangles,
            groups,
            materials,
            default_material,
            total_area: 0.0,
            bounds: AABB::default(),
            distribution: AreaWeightedSampler::default(),
        };
        mesh.validate()?;
        mesh.compute_metrics();
        Ok(mesh)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (i, tri) in self.triangles.iter().enumerate() {
            let in_range = tri.vertex.iter().all(|v| *v < self.vertices.len())
                && tri.normal.iter().all(|n| *n < self.normals.len())
                && tri.texcoord.iter().all(|t| *t < self.texcoords.len());
            if !in_range {
                return Err(format!("triangle {} indexes past the end of a buffer", i));
            }
            if tri.group >= self.groups.len() {
                return Err(format!("triangle {} refers to missing group {}", i, tri.group));
            }
        }

        let mut next = 0;
        for (gid, group) in self.groups.iter().enumerate() {
            if group.start != next {
                return Err(format!("group {} starts at {}, expected {}", gid, group.start, next));
            }
            let members = match self.triangles.get(group.range()) {
                Some(members) => members,
                None => return Err(format!("group {} ends past triangle {}", gid, self.triangles.len())),
            };
            if members.iter().any(|t| t.group != gid) {
                return Err(format!("group {} contains triangles of another group", gid));
            }
            next += group.length;
        }
        if next != self.triangles.len() {
            return Err(format!("groups cover {} of {} triangles", next, self.triangles.len()));
        }

        Ok(())
    }

    /// Recomputes per-triangle area and face normal, then the total area,
    /// bounds and area distribution.
    pub fn compute_metrics(&mut self) {
        let vertices = &self.vertices;
        let triangles = &mut self.triangles;

        if triangles.len() < PARALLEL_METRICS_THRESHOLD {
            for tri in triangles.iter_mut() {
                tri.compute_geometry(vertices);
            }
        } else {
            let thread_count = thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            let chunk_len = (triangles.len() + thread_count - 1) / thread_count;
            thread::scope(|scope| {
                for chunk in triangles.chunks_mut(chunk_len) {
                    scope.spawn(move || {
                        for tri in chunk.iter_mut() {
                            tri.compute_geometry(vertices);
                        }
                    });
                }
            });
        }

        self.distribution = AreaWeightedSampler::build(&self.triangles);
        self.total_area = self.distribution.total_area();
        self.bounds = AABB::from_points(self.vertices.iter());
    }

    /// Rewrites the buffers so every triangle owns three consecutive slots
    /// in each of them, in group order.
    pub fn flatten(&mut self) {
        let total = self.triangles.len() * 3;
        let mut vertices = Vec::with_capacity(total);
        let mut normals = Vec::with_capacity(total);
        let mut texcoords = Vec::with_capacity(total);

        let mut order = Vec::with_capacity(self.triangles.len());
        for group in &self.groups {
            order.extend(group.range());
        }

        let mut triangles = Vec::with_capacity(self.triangles.len());
        for idx in order {
            let tri = &self.triangles[idx];
            let base = vertices.len();
            for k in 0..3 {
                vertices.push(self.vertices[tri.vertex[k]]);
                normals.push(self.normals[tri.normal[k]]);
                texcoords.push(self.texcoords[tri.texcoord[k]]);
            }
            let slots = [base, base + 1, base + 2];
            triangles.push(Triangle::new(slots, slots, slots, tri.group));
        }

        self.vertices = vertices;
        self.normals = normals;
        self.texcoords = texcoords;
        self.triangles = triangles;
        self.compute_metrics();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vector3f] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3f] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[Vector2f] {
        &self.texcoords
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn groups(&self) -> &[TriangleGroup] {
        &self.groups
    }

    /// Named materials, excluding the default one.
    pub fn materials(&self) -> &HashMap<String, Material> {
        &self.materials
    }

    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    pub fn surface_area(&self) -> Float {
        self.total_area
    }

    pub fn bounding_box(&self) -> AABB {
        self.bounds
    }

    pub fn distribution(&self) -> &AreaWeightedSampler {
        &self.distribution
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn interpolate_position(&self, idx: usize, bary: &Vector3f) -> Vector3f {
        let (p0, p1, p2) = self.triangles[idx].positions(&self.vertices);
        p0 * bary.x + p1 * bary.y + p2 * bary.z
    }

    /// Blended vertex normal, renormalized. Falls back to the face normal
    /// when the blend cancels out.
    pub fn interpolate_normal(&self, idx: usize, bary: &Vector3f) -> Vector3f {
        let tri = &self.triangles[idx];
        let n0 = self.normals[tri.normal[0]];
        let n1 = self.normals[tri.normal[1]];
        let n2 = self.normals[tri.normal[2]];
        (n0 * bary.x + n1 * bary.y + n2 * bary.z)
            .try_normalize(0.0)
            .unwrap_or(tri.face_normal)
    }

    pub fn interpolate_texcoord(&self, idx: usize, bary: &Vector3f) -> Vector2f {
        let tri = &self.triangles[idx];
        let uv0 = self.texcoords[tri.texcoord[0]];
        let uv1 = self.texcoords[tri.texcoord[1]];
        let uv2 = self.texcoords[tri.texcoord[2]];
        uv0 * bary.x + uv1 * bary.y + uv2 * bary.z
    }

    /// Material of the group owning triangle `idx`; unknown names resolve to
    /// the default material.
    pub fn material(&self, idx: usize) -> &Material {
        let name = &self.groups[self.triangles[idx].group].material;
        self.materials.get(name).unwrap_or(&self.default_material)
    }

    /// Flat base color, or a filtered texture lookup at the interpolated
    /// texture coordinate when the material has a color texture bound.
    pub fn interpolate_color(
        &self,
        idx: usize,
        bary: &Vector3f,
        textures: &TextureStore,
        filter: FilterMode,
        rng: &mut LcgRng,
    ) -> Vector3f {
        let material = self.material(idx);
        match material.color_texture {
            None => material.base_color,
            Some(id) => {
                let uv = self.interpolate_texcoord(idx, bary);
                textures.sample(id, filter, &uv, rng).xyz()
            }
        }
    }

    /// Draws one point uniformly over the whole surface. `None` when the
    /// mesh has no area.
    pub fn sample_area_weighted(&self, rng: &mut LcgRng) -> Option<SurfaceSample> {
        if self.distribution.is_degenerate() {
            return None;
        }

        let triangle = self.distribution.select_triangle(rng.next_f32());
        let bary = self.distribution.sample_barycentric(rng);
        Some(SurfaceSample {
            position: self.interpolate_position(triangle, &bary),
            normal: self.interpolate_normal(triangle, &bary),
            triangle,
            pdf: 1.0 / self.total_area,
        })
    }
}
