//! Rendering core expressions for inspection
pub mod pretty;
