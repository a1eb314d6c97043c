// Copyright @yucwang 2026

pub mod filter;
pub mod image;
pub mod store;
