//! # Photo Annotator Renderer
//!
//! Turns fetched bytes into rasters the editor can place, and flattens the
//! editor's surface into the PNG the user downloads.
//!
//! ## Export pipeline
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌────────────┐   ┌─────┐
//! │ Surface  │ → │ SVG document  │ → │ resvg      │ → │ PNG │
//! │ objects  │   │ (photo as     │   │ tiny-skia  │   │     │
//! │          │   │  data URI)    │   │ pixmap     │   │     │
//! └──────────┘   └───────────────┘   └────────────┘   └─────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;

pub use error::{RenderError, RenderResult};
pub use export::{ExportArtifact, ExportConfig, SurfaceExporter, EXPORT_FILENAME, EXPORT_QUALITY};
pub use image::{decode_data_uri, decode_photo, ImageFormat};
