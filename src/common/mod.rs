//! Facilities shared across the crate
pub mod prettify;
pub mod sourcemap;
