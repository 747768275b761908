//! # Photo Annotator Core
//!
//! Editor model for annotating a photograph: a responsively sized surface,
//! a fitted background photo, and text/shape overlays on top of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               annotator-core                │
//! ├─────────────────────────────────────────────┤
//! │  Editor          │  Surface                 │
//! │  - Lifecycle     │  - Responsive sizing     │
//! │  - Load tickets  │  - Paint order           │
//! │  - Manipulation  │  - Focus / hit testing   │
//! ├─────────────────────────────────────────────┤
//! │  Fit-and-center  │  Overlays  │  Snapshots  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The crate does no I/O. Fetching and decoding photos, rendering, and
//! event plumbing belong to the host.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod descriptor;
pub mod editor;
pub mod element;
pub mod error;
pub mod fit;
pub mod overlay;
pub mod snapshot;
pub mod surface;

pub use descriptor::ImageDescriptor;
pub use editor::{Editor, LoadTicket};
pub use element::{text_line_height, Object, ObjectId, ObjectKind, Raster, Shape, ShapeKind};
pub use error::{EditorError, EditorResult};
pub use fit::{fit_and_center, Placement};
pub use snapshot::{LayerRecord, LayerSnapshot};
pub use surface::{Surface, Viewport};
