//! CLI command implementations.

pub mod common;
pub mod info;
pub mod params;
pub mod render;
pub mod state;
