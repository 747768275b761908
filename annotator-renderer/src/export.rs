//! Surface export to PNG.
//!
//! Builds an SVG description of the surface (photo embedded as a PNG data
//! URI, overlays as SVG primitives) and rasterizes it with resvg/tiny-skia.
//! Focus and selection state are never drawn.

use std::fmt::Write;
use std::sync::Arc;

use annotator_core::{text_line_height, Editor, Object, ObjectKind, Shape, Surface};

use crate::error::{RenderError, RenderResult};
use crate::image::encode_png_data_uri;

/// File name offered for the exported image.
pub const EXPORT_FILENAME: &str = "modified_image.png";

/// Encoder quality requested for exports.
pub const EXPORT_QUALITY: f32 = 0.8;

/// Configuration for surface export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Encoder quality in `0.0..=1.0`. PNG is lossless, so this is advisory.
    pub quality: f32,
    /// Color under everything as RGBA bytes (default: transparent).
    pub background: [u8; 4],
    /// Scale factor (e.g. 2.0 for retina).
    pub scale: f32,
    /// Font family used for captions.
    pub font_family: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: EXPORT_QUALITY,
            background: [0, 0, 0, 0],
            scale: 1.0,
            font_family: "Times New Roman, serif".to_string(),
        }
    }
}

/// A finished export ready to be offered as a download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Suggested file name.
    pub filename: String,
    /// PNG bytes.
    pub bytes: Vec<u8>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Flattens a [`Surface`] into a PNG.
pub struct SurfaceExporter {
    config: ExportConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SurfaceExporter {
    /// Create a new exporter with the given configuration.
    ///
    /// System fonts are loaded once here and reused for every export.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!("Loaded {} font faces for export", fontdb.len());
        Self {
            config,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the editor's surface as a downloadable PNG.
    ///
    /// Returns `Ok(None)` when there is nothing to export: no surface, or no
    /// photo loaded yet.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn export(&self, editor: &Editor) -> RenderResult<Option<ExportArtifact>> {
        let Some(surface) = editor.surface() else {
            tracing::debug!("Export ignored: no surface");
            return Ok(None);
        };
        if !editor.is_image_ready() {
            tracing::debug!("Export ignored: no photo loaded");
            return Ok(None);
        }

        let pixmap = self.rasterize(surface)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        tracing::debug!(
            "Encoding {width}x{height} PNG (quality {} is advisory for lossless output)",
            self.config.quality
        );
        let bytes = pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;

        tracing::info!("Exported {} ({} bytes)", EXPORT_FILENAME, bytes.len());
        Ok(Some(ExportArtifact {
            filename: EXPORT_FILENAME.to_string(),
            bytes,
            width,
            height,
        }))
    }

    /// Describe the surface as an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo cannot be embedded.
    #[allow(clippy::cast_precision_loss)]
    pub fn render_to_svg(&self, surface: &Surface) -> RenderResult<String> {
        let (out_w, out_h) = self.output_dimensions(surface);
        let scale = self.config.scale;
        let view_w = out_w as f32 / scale;
        let view_h = out_h as f32 / scale;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );

        let bg = &self.config.background;
        if bg[3] > 0 {
            let bg_alpha = f32::from(bg[3]) / 255.0;
            let _ = write!(
                svg,
                "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
                bg[0], bg[1], bg[2], bg_alpha,
            );
        }

        for object in surface.objects() {
            self.render_object_svg(&mut svg, object)?;
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Output dimensions (width, height) in pixels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn output_dimensions(&self, surface: &Surface) -> (u32, u32) {
        let out_w = (surface.width() * self.config.scale).round().max(1.0) as u32;
        let out_h = (surface.height() * self.config.scale).round().max(1.0) as u32;
        (out_w, out_h)
    }

    fn rasterize(&self, surface: &Surface) -> RenderResult<tiny_skia::Pixmap> {
        let svg_string = self.render_to_svg(surface)?;

        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(&svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let (px_w, px_h) = self.output_dimensions(surface);
        let mut pixmap = tiny_skia::Pixmap::new(px_w, px_h)
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }

    /// Render a single object to SVG.
    fn render_object_svg(&self, svg: &mut String, object: &Object) -> RenderResult<()> {
        let (left, top) = (object.left, object.top);
        let (width, height) = object.effective_size();

        match &object.kind {
            ObjectKind::Image { raster, .. } => {
                let href = encode_png_data_uri(raster)?;
                let _ = write!(
                    svg,
                    "<image x=\"{left}\" y=\"{top}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
                );
            }

            ObjectKind::Text {
                content,
                font_size,
                fill,
                ..
            } => {
                let family = escape_xml(&self.config.font_family);
                let fill = escape_xml(fill);
                let _ = write!(
                    svg,
                    "<text transform=\"translate({left},{top}) scale({},{})\" font-size=\"{font_size}\" fill=\"{fill}\" font-family=\"{family}\" xml:space=\"preserve\">",
                    object.scale_x, object.scale_y,
                );
                for (idx, line) in content.lines().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let baseline = font_size + idx as f32 * text_line_height(*font_size);
                    let _ = write!(
                        svg,
                        "<tspan x=\"0\" y=\"{baseline}\">{}</tspan>",
                        escape_xml(line)
                    );
                }
                svg.push_str("</text>");
            }

            ObjectKind::Shape(shape) => {
                let fill = escape_xml(shape.fill());
                match shape {
                    Shape::Circle { .. } => {
                        let (rx, ry) = (width / 2.0, height / 2.0);
                        let _ = write!(
                            svg,
                            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{rx}\" ry=\"{ry}\" fill=\"{fill}\"/>",
                            left + rx,
                            top + ry,
                        );
                    }
                    Shape::Rectangle { .. } => {
                        let _ = write!(
                            svg,
                            "<rect x=\"{left}\" y=\"{top}\" width=\"{width}\" height=\"{height}\" fill=\"{fill}\"/>",
                        );
                    }
                    Shape::Triangle { .. } => {
                        // Apex at top-center, base along the bottom edge
                        let _ = write!(
                            svg,
                            "<polygon points=\"{},{} {},{} {},{}\" fill=\"{fill}\"/>",
                            left,
                            top + height,
                            left + width / 2.0,
                            top,
                            left + width,
                            top + height,
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for SurfaceExporter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
