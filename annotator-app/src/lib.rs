//! # Photo Annotator
//!
//! Headless host for the annotator editor.
//!
//! This crate finds a photo (by URL or by searching the photo provider),
//! drives an [`EditorSession`](session::EditorSession) that owns the editor
//! surface, and writes the flattened PNG to disk.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p annotator-app -- --image-url https://images.example/photo.jpg \
//!     --caption "Hello" --shape circle --snapshot
//! ```
//!
//! ## With the photo provider:
//!
//! ```bash
//! UNSPLASH_ACCESS_KEY=... cargo run -p annotator-app -- --query mountains --pick 1
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Viewport, photo source, overlays and output settings
//! - `EditorSession` - Single task owning the editor, its viewport listener and
//!   in-flight loads
//! - `HttpImageFetcher` / `UnsplashClient` - Network collaborators

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod fetch;
pub mod provider;
pub mod session;

use std::path::{Path, PathBuf};

use annotator_core::{ShapeKind, Viewport};
use annotator_renderer::ExportArtifact;
use clap::Parser;

pub use fetch::{FetchError, HttpImageFetcher, ImageFetcher};
pub use provider::{ProviderError, UnsplashClient};
pub use session::{spawn_editor, EditorEvent, EditorHandle, EditorSession, SessionError};

/// Default photo provider API root.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.unsplash.com";

/// Command-line arguments for photo-annotator.
#[derive(Debug, Clone, Parser)]
#[command(name = "photo-annotator")]
#[command(about = "Fit a photo onto a canvas, annotate it and export a PNG")]
#[command(version)]
pub struct CliArgs {
    /// Keyword search sent to the photo provider
    #[arg(long, conflicts_with = "image_url", required_unless_present = "image_url")]
    pub query: Option<String>,

    /// Full-resolution photo URL (http, https, file or data)
    #[arg(long)]
    pub image_url: Option<String>,

    /// Which search result to use (0-based)
    #[arg(long, default_value_t = 0)]
    pub pick: usize,

    /// Photo provider API root
    #[arg(long, env = "UNSPLASH_API_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    /// Photo provider access key
    #[arg(long, env = "UNSPLASH_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// Viewport width in pixels
    #[arg(long, default_value = "1280")]
    pub viewport_width: f32,

    /// Viewport height in pixels
    #[arg(long, default_value = "800")]
    pub viewport_height: f32,

    /// Add a caption with this content (repeatable)
    #[arg(long = "caption")]
    pub captions: Vec<String>,

    /// Add a shape: circle, rectangle or triangle (repeatable)
    #[arg(long = "shape")]
    pub shapes: Vec<ShapeKind>,

    /// Print the layer snapshot as JSON
    #[arg(long)]
    pub snapshot: bool,

    /// Directory the exported PNG is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Where the photo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// A URL supplied directly.
    Url(String),
    /// A provider search and the index of the result to use.
    Search {
        /// Keyword query.
        query: String,
        /// 0-based result index.
        pick: usize,
    },
}

/// Photo provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API root.
    pub base_url: String,
    /// Access key sent as `client_id`.
    pub access_key: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host viewport the surface is sized from.
    pub viewport: Viewport,
    /// Photo to annotate.
    pub source: PhotoSource,
    /// Photo provider settings.
    pub provider: ProviderConfig,
    /// Captions to add, in order.
    pub captions: Vec<String>,
    /// Shapes to add, in order.
    pub shapes: Vec<ShapeKind>,
    /// Whether to print the layer snapshot.
    pub snapshot: bool,
    /// Output directory for the export.
    pub out_dir: PathBuf,
}

impl From<CliArgs> for AppConfig {
    fn from(args: CliArgs) -> Self {
        let source = match (args.image_url, args.query) {
            (Some(url), _) => PhotoSource::Url(url),
            (None, query) => PhotoSource::Search {
                query: query.unwrap_or_default(),
                pick: args.pick,
            },
        };
        Self {
            viewport: Viewport::new(args.viewport_width, args.viewport_height),
            source,
            provider: ProviderConfig {
                base_url: args.provider_url,
                access_key: args.access_key,
            },
            captions: args.captions,
            shapes: args.shapes,
            snapshot: args.snapshot,
            out_dir: args.out_dir,
        }
    }
}

/// Write `artifact` to `<out_dir>/<artifact.filename>`, creating `out_dir`
/// if needed, and return the written path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub async fn save_export(out_dir: &Path, artifact: &ExportArtifact) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(&artifact.filename);
    tokio::fs::write(&path, &artifact.bytes).await?;
    Ok(path)
}
