//! The core expression representation and the mixin passes
pub mod analyse;
pub mod config;
pub mod export;
pub mod expr;
pub mod metadata;
pub mod names;
pub mod publish;
pub mod transform;
pub mod unit;
