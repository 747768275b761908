//! Image descriptors handed over by the image provider.

use serde::{Deserialize, Serialize};

/// A photo picked from the provider's search results.
///
/// Only `full_url` is interpreted by the editor; the other fields travel along
/// for the host's benefit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Opaque identifier assigned by the provider.
    pub id: String,
    /// Full-resolution URL used for loading.
    pub full_url: String,
    /// Thumbnail URL for result lists.
    pub thumb_url: String,
    /// Optional human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ImageDescriptor {
    /// Descriptor for a bare URL, used when no provider is involved.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            thumb_url: url.clone(),
            full_url: url,
            description: None,
        }
    }
}
