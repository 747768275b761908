//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
///
/// None of these are fatal. Public editor operations degrade them to a
/// no-op plus a diagnostic trace; the typed variants exist so hosts and tests
/// can tell the outcomes apart.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The operation needs a live surface (or a loaded image) that does not exist yet.
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(&'static str),

    /// The background image could not be fetched or decoded.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// A superseded load completed after a newer one started.
    #[error("Stale load completion: generation {generation} superseded by {current}")]
    StaleLoad {
        /// Generation carried by the completing load.
        generation: u64,
        /// Generation that is current on the editor.
        current: u64,
    },

    /// Object not found on the surface.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Invalid operation on an object (e.g. selecting the background).
    #[error("Invalid operation on object: {0}")]
    InvalidOperation(String),

    /// Snapshot serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
