//! Surface objects - the background photo and the overlays painted on top of it.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EditorError;

/// Average glyph advance as a fraction of the font size.
const TEXT_CHAR_ADVANCE: f32 = 0.5;

/// Line height as a multiple of the font size.
const TEXT_LINE_HEIGHT: f32 = 1.16;

/// Distance between consecutive caption baselines at `font_size`.
///
/// Used for both layer metrics and exported caption baselines.
#[must_use]
pub fn text_line_height(font_size: f32) -> f32 {
    font_size * TEXT_LINE_HEIGHT
}

/// Unique identifier for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded RGBA pixels of a loaded photo.
///
/// Cloning is cheap: the pixel buffer is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    rgba: Arc<Vec<u8>>,
}

impl Raster {
    /// Wrap an RGBA buffer (4 bytes per pixel, row-major).
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the buffer length does
    /// not match `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::ImageLoad(format!(
                "image has empty dimensions {width}x{height}"
            )));
        }
        let expected = u64::from(width) * u64::from(height) * 4;
        if rgba.len() as u64 != expected {
            return Err(EditorError::ImageLoad(format!(
                "pixel buffer is {} bytes, expected {expected}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }

    /// Natural width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// The kinds of shape an overlay can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// A circle sized by its radius.
    Circle,
    /// An axis-aligned rectangle.
    Rectangle,
    /// An isosceles triangle with its apex at the top-center of its box.
    Triangle,
}

impl ShapeKind {
    /// Lowercase name used in layer snapshots and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Rectangle => "rectangle",
            Self::Triangle => "triangle",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(Self::Circle),
            "rectangle" | "rect" => Ok(Self::Rectangle),
            "triangle" => Ok(Self::Triangle),
            other => Err(EditorError::InvalidOperation(format!(
                "unknown shape kind '{other}'"
            ))),
        }
    }
}

/// Shape geometry and fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    /// A circle.
    Circle {
        /// Radius in pixels, before scaling.
        radius: f32,
        /// Fill color (CSS color string).
        fill: String,
    },
    /// A rectangle.
    Rectangle {
        /// Width in pixels, before scaling.
        width: f32,
        /// Height in pixels, before scaling.
        height: f32,
        /// Fill color (CSS color string).
        fill: String,
    },
    /// A triangle.
    Triangle {
        /// Width of the bounding box, before scaling.
        width: f32,
        /// Height of the bounding box, before scaling.
        height: f32,
        /// Fill color (CSS color string).
        fill: String,
    },
}

impl Shape {
    /// Which kind of shape this is.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Triangle { .. } => ShapeKind::Triangle,
        }
    }

    /// Fill color.
    #[must_use]
    pub fn fill(&self) -> &str {
        match self {
            Self::Circle { fill, .. }
            | Self::Rectangle { fill, .. }
            | Self::Triangle { fill, .. } => fill,
        }
    }

    /// Unscaled bounding box. A circle's box is its diameter on both axes.
    #[must_use]
    pub fn base_size(&self) -> (f32, f32) {
        match self {
            Self::Circle { radius, .. } => (radius * 2.0, radius * 2.0),
            Self::Rectangle { width, height, .. } | Self::Triangle { width, height, .. } => {
                (*width, *height)
            }
        }
    }
}

/// The content an object carries.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ObjectKind {
    /// The fitted source photo.
    Image {
        /// Source reference the photo was loaded from.
        src: String,
        /// Decoded pixels at natural size.
        #[serde(skip)]
        raster: Raster,
    },

    /// A text caption.
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels.
        font_size: f32,
        /// Fill color (CSS color string).
        fill: String,
        /// Whether the user may edit the content in place.
        editable: bool,
    },

    /// A filled geometric shape.
    Shape(Shape),
}

impl ObjectKind {
    /// Type tag reported in layer snapshots.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Shape(shape) => shape.kind().as_str(),
        }
    }
}

/// An object on the surface with its placement.
///
/// `left`/`top` locate the top-left corner of the object's bounding box in
/// surface coordinates. Size is the kind's base size times the independent
/// scale factors.
#[derive(Debug, Clone, Serialize)]
pub struct Object {
    /// Unique identifier.
    pub id: ObjectId,
    /// Object content.
    pub kind: ObjectKind,
    /// Left edge in surface coordinates.
    pub left: f32,
    /// Top edge in surface coordinates.
    pub top: f32,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Whether the user can select and manipulate this object.
    pub selectable: bool,
}

impl Object {
    /// Create a new selectable object at the origin with unit scale.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            selectable: true,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, left: f32, top: f32) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Set both scale factors.
    #[must_use]
    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Set whether the object is selectable.
    #[must_use]
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Whether this is the background photo.
    #[must_use]
    pub fn is_background(&self) -> bool {
        matches!(self.kind, ObjectKind::Image { .. })
    }

    /// Unscaled size of the object.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn base_size(&self) -> (f32, f32) {
        match &self.kind {
            ObjectKind::Image { raster, .. } => (raster.width() as f32, raster.height() as f32),
            ObjectKind::Text {
                content, font_size, ..
            } => text_metrics(content, *font_size),
            ObjectKind::Shape(shape) => shape.base_size(),
        }
    }

    /// Size as drawn: base size times the scale factors.
    #[must_use]
    pub fn effective_size(&self) -> (f32, f32) {
        let (w, h) = self.base_size();
        (w * self.scale_x, h * self.scale_y)
    }

    /// Check if a point (in surface coordinates) is within this object's box.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let (w, h) = self.effective_size();
        x >= self.left && x <= self.left + w && y >= self.top && y <= self.top + h
    }
}

/// Estimated box of unscaled text: longest line by glyph count, one line
/// height per line.
#[allow(clippy::cast_precision_loss)]
fn text_metrics(content: &str, font_size: f32) -> (f32, f32) {
    let longest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let lines = content.lines().count().max(1);
    (
        longest as f32 * font_size * TEXT_CHAR_ADVANCE,
        lines as f32 * text_line_height(font_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: u32, height: u32) -> Raster {
        Raster::new(width, height, vec![0; (width * height * 4) as usize]).expect("raster")
    }

    #[test]
    fn circle_size_is_diameter() {
        let circle = Object::new(ObjectKind::Shape(Shape::Circle {
            radius: 50.0,
            fill: "red".to_string(),
        }));
        assert_eq!(circle.effective_size(), (100.0, 100.0));
    }

    #[test]
    fn scale_factors_apply_independently() {
        let rect = Object::new(ObjectKind::Shape(Shape::Rectangle {
            width: 100.0,
            height: 70.0,
            fill: "blue".to_string(),
        }))
        .with_scale(2.0, 0.5);
        assert_eq!(rect.effective_size(), (200.0, 35.0));
    }

    #[test]
    fn image_size_uses_natural_dimensions() {
        let image = Object::new(ObjectKind::Image {
            src: "https://images.example/a.jpg".to_string(),
            raster: raster(4, 2),
        })
        .with_scale(0.5, 0.5);
        assert_eq!(image.effective_size(), (2.0, 1.0));
        assert!(image.is_background());
    }

    #[test]
    fn text_metrics_track_longest_line() {
        let text = Object::new(ObjectKind::Text {
            content: "ab\nabcd".to_string(),
            font_size: 10.0,
            fill: "black".to_string(),
            editable: true,
        });
        let (w, h) = text.effective_size();
        assert!((w - 20.0).abs() < f32::EPSILON);
        assert!((h - 23.2).abs() < 1e-4);
    }

    #[test]
    fn raster_rejects_mismatched_buffer() {
        assert!(Raster::new(2, 2, vec![0; 15]).is_err());
        assert!(Raster::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn shape_kind_parses_aliases() {
        assert_eq!("rect".parse::<ShapeKind>().ok(), Some(ShapeKind::Rectangle));
        assert_eq!("Circle".parse::<ShapeKind>().ok(), Some(ShapeKind::Circle));
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn contains_point_uses_scaled_box() {
        let rect = Object::new(ObjectKind::Shape(Shape::Rectangle {
            width: 10.0,
            height: 10.0,
            fill: "blue".to_string(),
        }))
        .at(5.0, 5.0)
        .with_scale(2.0, 2.0);
        assert!(rect.contains_point(24.0, 24.0));
        assert!(!rect.contains_point(26.0, 10.0));
    }
}
