//! Default overlays the user can drop onto the photo.
//!
//! Each shape kind starts at its own offset so successive additions do not
//! stack exactly on top of each other.

use crate::{Object, ObjectKind, Shape, ShapeKind};

/// Content of a freshly added caption.
pub const DEFAULT_TEXT: &str = "Text....";

/// Font size of a freshly added caption.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Fill of a freshly added caption.
pub const DEFAULT_TEXT_FILL: &str = "black";

/// Position of a freshly added caption.
pub const DEFAULT_TEXT_POSITION: (f32, f32) = (100.0, 100.0);

/// A selectable, editable caption with the default content and style.
#[must_use]
pub fn text() -> Object {
    let (left, top) = DEFAULT_TEXT_POSITION;
    Object::new(ObjectKind::Text {
        content: DEFAULT_TEXT.to_string(),
        font_size: DEFAULT_FONT_SIZE,
        fill: DEFAULT_TEXT_FILL.to_string(),
        editable: true,
    })
    .at(left, top)
}

/// A selectable shape of the given kind with its default size, fill and
/// position.
#[must_use]
pub fn shape(kind: ShapeKind) -> Object {
    let (shape, left, top) = match kind {
        ShapeKind::Circle => (
            Shape::Circle {
                radius: 50.0,
                fill: "red".to_string(),
            },
            150.0,
            150.0,
        ),
        ShapeKind::Rectangle => (
            Shape::Rectangle {
                width: 100.0,
                height: 70.0,
                fill: "blue".to_string(),
            },
            200.0,
            200.0,
        ),
        ShapeKind::Triangle => (
            Shape::Triangle {
                width: 100.0,
                height: 100.0,
                fill: "green".to_string(),
            },
            250.0,
            250.0,
        ),
    };
    Object::new(ObjectKind::Shape(shape)).at(left, top)
}
