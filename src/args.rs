// Copyright @yucwang 2026

use clap::Parser;
use meshsampler::core::config::{DEFAULT_MEMORY_MB, DEFAULT_SAMPLE_COUNT};
use meshsampler::textures::filter::FilterMode;

/// Densely samples the surface of an OBJ mesh into a binary PLY point cloud.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input OBJ file. MTL libraries and textures are resolved next to it.
    pub input: String,

    /// Output PLY path. Defaults to `<input>.sampled.ply`.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of surface samples to draw.
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub samples: usize,

    /// Memory budget for buffered samples, in megabytes.
    #[arg(short, long, default_value_t = DEFAULT_MEMORY_MB)]
    pub memory: usize,

    /// Write per-sample colors.
    #[arg(short, long)]
    pub colors: bool,

    /// Write per-sample normals.
    #[arg(short, long)]
    pub normals: bool,

    /// Texture filter: nearest, linear, sharp or smooth.
    #[arg(short, long, default_value = "linear")]
    pub filter: FilterMode,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn output_path(&self) -> String {
        match &self.output {
            Some(path) => path.clone(),
            None => format!("{}.sampled.ply", self.input),
        }
    }
}
