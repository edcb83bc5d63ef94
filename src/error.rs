//! Error types for scene setup and mesh handling.

use thiserror::Error;

use crate::math::Real;

#[derive(Debug, Error, PartialEq)]
pub enum MpmError {
    #[error("degenerate scene: total seeding volume is {total_volume}")]
    DegenerateScene { total_volume: Real },

    #[error("unsupported face {face}: {vertex_count} vertices (only triangles and quads)")]
    UnsupportedFace { face: usize, vertex_count: usize },

    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    InvalidMeshIndex { index: u32, vertex_count: usize },

    #[error("invalid solver parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, MpmError>;

/// A particle whose deformation state left the physically meaningful range.
///
/// Not an error: the substep has no retry path, so this is only reported (and
/// optionally clamped) by the validation pass.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("numerical instability at particle {particle}: det(F) = {determinant}")]
pub struct NumericalInstability {
    pub particle: usize,
    pub determinant: Real,
}
