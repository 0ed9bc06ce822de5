//! Text format primitives for legacy fixed-column model files.

pub mod primitives;
