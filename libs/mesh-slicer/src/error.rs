//! # Mesh Errors
//!
//! Error types for surface validation, slicing and cap generation.

use thiserror::Error;

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while building, validating or slicing a surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Vertex attribute layout is malformed or unsupported
    #[error("Invalid layout: {message}")]
    InvalidLayout { message: String },

    /// Submesh topology is not supported by the operation
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Triangle index refers past the vertex buffer
    #[error("Index {index} out of range (vertex count: {count})")]
    IndexOutOfRange { index: u32, count: usize },

    /// Submesh ranges do not partition the triangle buffer
    #[error("Invalid submesh: {message}")]
    InvalidSubMesh { message: String },

    /// Source and destination layouts differ
    #[error("Layout mismatch: {message}")]
    LayoutMismatch { message: String },

    /// Settings are outside the accepted range
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// Degenerate geometry
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry { message: String },
}

impl MeshError {
    /// Creates an invalid layout error.
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            message: message.into(),
        }
    }

    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Creates an invalid submesh error.
    pub fn invalid_submesh(message: impl Into<String>) -> Self {
        Self::InvalidSubMesh {
            message: message.into(),
        }
    }

    /// Creates a layout mismatch error.
    pub fn layout_mismatch(message: impl Into<String>) -> Self {
        Self::LayoutMismatch {
            message: message.into(),
        }
    }

    /// Creates an invalid settings error.
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }
}
