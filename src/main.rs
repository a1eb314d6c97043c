// Copyright 2020 TwoCookingMice

mod args;

use clap::Parser;
use env_logger::Env;
use meshsampler::core::config::SamplerConfig;
use meshsampler::io::obj_utils;
use meshsampler::io::ply_writer::AttributeMask;
use meshsampler::samplers::MeshSampler;
use meshsampler::textures::store::TextureStore;

use args::Args;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args.output_path();

    let mut textures = TextureStore::new();
    let mesh = match obj_utils::load_mesh_from_file(&args.input, &mut textures) {
        Ok(mesh) => mesh,
        Err(e) => {
            log::error!("Failed to load {}: {}", args.input, e);
            std::process::exit(1);
        }
    };

    let mut attributes = AttributeMask::VERTICES;
    if args.colors {
        attributes |= AttributeMask::COLORS;
    }
    if args.normals {
        attributes |= AttributeMask::NORMALS;
    }

    let config = SamplerConfig {
        samples: args.samples,
        memory_mb: args.memory,
        attributes,
        filter: args.filter,
        seed: args.seed,
        show_progress: !args.quiet,
    };

    let mut sampler = MeshSampler::new(&mesh, &textures, config);
    match sampler.run(&output) {
        Ok(report) => log::info!(
            "Done: {} of {} samples in {} chunks (capacity {}).",
            report.emitted,
            report.requested,
            report.chunks_flushed,
            report.chunk_capacity
        ),
        Err(e) => {
            log::error!("Sampling failed: {}", e);
            std::process::exit(1);
        }
    }
}
