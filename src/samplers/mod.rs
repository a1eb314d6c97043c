// Copyright @yucwang 2026

pub mod area_weighted;
pub mod mesh_sampler;

pub use mesh_sampler::{MeshSampler, SampleReport, SamplerState};
