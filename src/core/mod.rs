// Copyright @yucwang 2021

pub mod config;
pub mod error;
pub mod rng;
