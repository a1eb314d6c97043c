// Copyright @yucwang 2026

use super::filter::{self, FilterMode};
use super::image::ImageTexture;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector2f, Vector4f};

use std::collections::HashMap;

/// Stable index of a texture inside a `TextureStore`.
pub type TextureId = usize;

/// Arena of decoded textures for one sampling run, addressed by id and by
/// source path. Repeated requests for the same path resolve to the same id.
#[derive(Default)]
pub struct TextureStore {
    textures: Vec<ImageTexture>,
    index: HashMap<String, TextureId>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `path` to an id, decoding the file on first request. Decode
    /// failures are logged and yield `None` so callers fall back to a flat
    /// color.
    pub fn texture_id(&mut self, path: &str) -> Option<TextureId> {
        if let Some(id) = self.index.get(path) {
            return Some(*id);
        }

        match ImageTexture::from_file(path) {
            Ok(texture) => {
                let (width, height) = texture.dimensions();
                log::info!("Loaded texture {} ({}x{}, {} channels).", path, width, height, texture.channels());
                Some(self.insert(path, texture))
            }
            Err(e) => {
                log::warn!("Could not load texture {}: {}.", path, e);
                None
            }
        }
    }

    /// Registers an already decoded texture under `name`. If the name is
    /// taken, the existing id is returned and `texture` is dropped.
    pub fn insert(&mut self, name: &str, texture: ImageTexture) -> TextureId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = self.textures.len();
        self.textures.push(texture);
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, id: TextureId) -> Option<&ImageTexture> {
        self.textures.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ImageTexture> {
        self.index.get(name).and_then(|id| self.get(*id))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Filtered lookup; unknown ids return opaque white.
    pub fn sample(&self, id: TextureId, mode: FilterMode, uv: &Vector2f, rng: &mut LcgRng) -> Vector4f {
        match self.get(id) {
            Some(texture) => filter::sample(texture, mode, uv.x, uv.y, rng),
            None => Vector4f::new(1.0 as Float, 1.0, 1.0, 1.0),
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.index.clear();
    }
}
