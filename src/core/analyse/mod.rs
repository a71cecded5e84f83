//! Analyses over method bodies
pub mod scope;
