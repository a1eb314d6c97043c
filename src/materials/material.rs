// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};
use crate::textures::store::TextureId;

pub const DEFAULT_MATERIAL: &str = "default";

/// Surface description referenced by name from a triangle group.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// Color used when no color texture is bound.
    pub base_color: Vector3f,
    pub reflectance: Float,
    pub metallic: Float,
    pub roughness: Float,
    pub color_texture_file: Option<String>,
    pub color_texture: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self::named(DEFAULT_MATERIAL)
    }
}

impl Material {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_color: Vector3f::new(0.95, 0.93, 0.89),
            reflectance: 0.05,
            metallic: 0.0,
            roughness: 0.8,
            color_texture_file: None,
            color_texture: None,
        }
    }

    pub fn with_base_color(mut self, color: Vector3f) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_color_texture(mut self, id: TextureId) -> Self {
        self.color_texture = Some(id);
        self
    }

    /// Phong-style shininess in [0, 255] mapped to a roughness in [0, 1].
    pub fn set_shininess(&mut self, ns: Float) {
        let r = 1.0 - ns / 255.0;
        self.roughness = r * r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let m = Material::default();
        assert_eq!(m.name, DEFAULT_MATERIAL);
        assert_eq!(m.color_texture, None);
        assert!((m.roughness - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_shininess_to_roughness() {
        let mut m = Material::named("metal");
        m.set_shininess(255.0);
        assert_eq!(m.roughness, 0.0);
        m.set_shininess(0.0);
        assert_eq!(m.roughness, 1.0);
    }
}
