// Copyright @yucwang 2026

use crate::materials::material::{Material, DEFAULT_MATERIAL};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::shapes::triangle::Triangle;
use crate::shapes::triangle_mesh::{TriangleGroup, TriangleMesh};
use crate::textures::store::TextureStore;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
    /// Parsed data that does not form a valid mesh.
    Mesh(String),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {}", err),
            ObjLoadError::Mesh(msg) => write!(f, "invalid mesh: {}", msg),
        }
    }
}

impl std::error::Error for ObjLoadError {}

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet, ParseError> {
    let triangulated = triangulate_faces(input.as_ref());
    obj::parse(triangulated)
}

/// Loads an OBJ file and the MTL libraries it references. Texture paths are
/// resolved relative to the folder of the MTL naming them.
pub fn load_mesh_from_file<P: AsRef<Path>>(path: P, textures: &mut TextureStore) -> Result<TriangleMesh, ObjLoadError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let folder = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut materials = HashMap::new();
    for library in material_libraries(&data) {
        let mtl_path = folder.join(&library);
        match fs::read_to_string(&mtl_path) {
            Ok(mtl) => {
                let mtl_folder = mtl_path.parent().unwrap_or(folder);
                materials.extend(parse_mtl(&mtl, mtl_folder, textures));
            }
            Err(err) => log::warn!("Cannot open material library {}: {}", mtl_path.display(), err),
        }
    }

    build_mesh(&name, &data, materials)
}

/// Loads a mesh from OBJ text with an already resolved material table.
pub fn load_mesh_from_str(name: &str, input: &str, materials: HashMap<String, Material>) -> Result<TriangleMesh, ObjLoadError> {
    build_mesh(name, input, materials)
}

/// Parses MTL text. Only `newmtl`, `Kd`, `Ks`, `Ns` and `map_Kd` are read;
/// `map_Kd` paths are joined to `folder` and loaded through `textures`.
pub fn parse_mtl(input: &str, folder: &Path, textures: &mut TextureStore) -> HashMap<String, Material> {
    let mut materials = HashMap::new();
    materials.insert(DEFAULT_MATERIAL.to_string(), Material::default());
    let mut current = DEFAULT_MATERIAL.to_string();

    for line in input.lines() {
        let mut tokens = line.split_whitespace();
        let keyword = match tokens.next() {
            Some(k) => k,
            None => continue,
        };

        match keyword {
            "newmtl" => {
                let name = tokens.next().unwrap_or(DEFAULT_MATERIAL).to_string();
                materials
                    .entry(name.clone())
                    .or_insert_with(|| Material::named(&name));
                current = name;
            }
            "Kd" => {
                if let Some([r, g, b]) = parse_floats::<3>(tokens) {
                    if let Some(m) = materials.get_mut(&current) {
                        m.base_color = Vector3f::new(r, g, b);
                    }
                }
            }
            "Ks" => {
                if let Some([r]) = parse_floats::<1>(tokens) {
                    if let Some(m) = materials.get_mut(&current) {
                        m.reflectance = r;
                    }
                }
            }
            "Ns" => {
                if let Some([ns]) = parse_floats::<1>(tokens) {
                    if let Some(m) = materials.get_mut(&current) {
                        m.set_shininess(ns);
                    }
                }
            }
            k if k.eq_ignore_ascii_case("map_kd") => {
                if let Some(file) = tokens.next() {
                    let full = folder.join(file).to_string_lossy().into_owned();
                    let id = textures.texture_id(&full);
                    if let Some(m) = materials.get_mut(&current) {
                        m.color_texture_file = Some(full);
                        m.color_texture = id;
                    }
                }
            }
            _ => {}
        }
    }

    materials
}

fn parse_floats<'a, const N: usize>(mut tokens: impl Iterator<Item = &'a str>) -> Option<[Float; N]> {
    let mut out = [0.0; N];
    for v in out.iter_mut() {
        *v = tokens.next()?.parse().ok()?;
    }
    Some(out)
}

fn material_libraries(input: &str) -> Vec<String> {
    input
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("mtllib") => Some(tokens.map(str::to_string).collect::<Vec<_>>()),
                _ => None,
            }
        })
        .flatten()
        .collect()
}

fn build_mesh(name: &str, input: &str, materials: HashMap<String, Material>) -> Result<TriangleMesh, ObjLoadError> {
    let obj_set = load_obj_from_str(input)?;

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut triangles = Vec::new();
    let mut groups: Vec<TriangleGroup> = Vec::new();
    let mut dummy_texcoord = None;

    for object in obj_set.objects {
        // Indices in each object are local to it.
        let vertex_base = vertices.len();
        let normal_base = normals.len();
        let texcoord_base = texcoords.len();

        for v in &object.vertices {
            vertices.push(Vector3f::new(v.x as Float, v.y as Float, v.z as Float));
        }
        for vn in &object.normals {
            normals.push(Vector3f::new(vn.x as Float, vn.y as Float, vn.z as Float));
        }
        for vt in &object.tex_vertices {
            texcoords.push(Vector2f::new(vt.u as Float, vt.v as Float));
        }

        for geom in &object.geometry {
            let material = geom.material_name.as_deref().unwrap_or(DEFAULT_MATERIAL);
            let same_material = groups.last().map_or(false, |g| g.material == material);
            if !same_material {
                groups.push(TriangleGroup::new(triangles.len(), 0, material));
            }
            let group_id = groups.len() - 1;

            for shape in &geom.shapes {
                if let obj::Primitive::Triangle(a, b, c) = &shape.primitive {
                    let vertex = [vertex_base + a.0, vertex_base + b.0, vertex_base + c.0];

                    let normal = match (a.2, b.2, c.2) {
                        (Some(n0), Some(n1), Some(n2)) => [normal_base + n0, normal_base + n1, normal_base + n2],
                        _ => {
                            let n = match (vertices.get(vertex[0]), vertices.get(vertex[1]), vertices.get(vertex[2])) {
                                (Some(p0), Some(p1), Some(p2)) => (p1 - p0).cross(&(p2 - p0)).try_normalize(0.0),
                                _ => None,
                            }
                            .unwrap_or_else(Vector3f::z);
                            normals.push(n);
                            let idx = normals.len() - 1;
                            [idx; 3]
                        }
                    };

                    let texcoord = match (a.1, b.1, c.1) {
                        (Some(t0), Some(t1), Some(t2)) => [texcoord_base + t0, texcoord_base + t1, texcoord_base + t2],
                        _ => {
                            let idx = *dummy_texcoord.get_or_insert_with(|| {
                                texcoords.push(Vector2f::zeros());
                                texcoords.len() - 1
                            });
                            [idx; 3]
                        }
                    };

                    triangles.push(Triangle::new(vertex, normal, texcoord, group_id));
                    groups[group_id].length += 1;
                }
            }
        }
    }

    groups.retain(|g| g.length > 0);
    // Dropping empty groups shifts ids; renumber the triangles to match.
    for (gid, group) in groups.iter().enumerate() {
        for tri in &mut triangles[group.range()] {
            tri.group = gid;
        }
    }

    let mesh = TriangleMesh::new(name, vertices, normals, texcoords, triangles, groups, materials)
        .map_err(ObjLoadError::Mesh)?;
    log::info!(
        "Loaded mesh {}: {} vertices, {} triangles, {} groups, extent {:?}.",
        name,
        mesh.vertices().len(),
        mesh.triangles().len(),
        mesh.groups().len(),
        mesh.bounding_box().diagonal().as_slice()
    );
    Ok(mesh)
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for pair in parts[2..].windows(2) {
                    out.push_str(&format!("f {} {} {}\n", base, pair[0], pair[1]));
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
