// Copyright @yucwang 2026

pub mod material;

pub use material::Material;
