//! Construction-time validation errors.
//!
//! Ticks never fail; these only surface when a caller asks for a blob that
//! cannot be meshed.

use thiserror::Error;

use crate::config::MIN_VERTEX_COUNT;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Radii must be finite and positive.
    #[error("radii must be finite and positive (inner {inner}, outer {outer})")]
    InvalidRadius { inner: f32, outer: f32 },
    /// The outer ring must enclose the inner ring.
    #[error("inner radius {inner} must be smaller than outer radius {outer}")]
    InvertedRim { inner: f32, outer: f32 },
    /// The ring needs at least [`MIN_VERTEX_COUNT`] vertices.
    #[error("blob needs at least {min} vertices (got {count})", min = MIN_VERTEX_COUNT)]
    InsufficientVertices { count: usize },
    /// Spawn or rebuild center is not a finite point.
    #[error("blob center must be finite")]
    NonFiniteCenter,
}
