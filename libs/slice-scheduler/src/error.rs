//! # Scheduler Errors
//!
//! Error types for scheduling and materializing slices.

use mesh_slicer::MeshError;
use thiserror::Error;

/// Result type for scheduler operations.
pub type SliceResult<T> = Result<T, SliceError>;

/// Errors reported by the slice scheduler before any task starts.
#[derive(Debug, Error)]
pub enum SliceError {
    /// Structural precondition violated (topology, layouts, settings, plane)
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Mesh error raised by a collaborator
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SliceError {
    /// Creates an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
