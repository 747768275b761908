//! Renderer error types.

use annotator_core::EditorError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while decoding photos or exporting the surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Photo bytes or data URI could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Building, rasterizing or encoding the export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<RenderError> for EditorError {
    fn from(err: RenderError) -> Self {
        EditorError::ImageLoad(err.to_string())
    }
}
