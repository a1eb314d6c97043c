// Copyright @yucwang 2026

use crate::io::ply_writer::AttributeMask;
use crate::textures::filter::FilterMode;

pub const DEFAULT_SAMPLE_COUNT: usize = 1_000_000;
pub const DEFAULT_MEMORY_MB: usize = 64;

/// Settings for one sampling run.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Requested number of surface samples.
    pub samples: usize,
    /// Budget for buffered samples, in megabytes.
    pub memory_mb: usize,
    pub attributes: AttributeMask,
    pub filter: FilterMode,
    /// Fixed seed for reproducible output; `None` seeds from the clock.
    pub seed: Option<u64>,
    pub show_progress: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLE_COUNT,
            memory_mb: DEFAULT_MEMORY_MB,
            attributes: AttributeMask::VERTICES,
            filter: FilterMode::Bilinear,
            seed: None,
            show_progress: true,
        }
    }
}

impl SamplerConfig {
    pub fn memory_bytes(&self) -> usize {
        self.memory_mb.saturating_mul(1024 * 1024)
    }
}
