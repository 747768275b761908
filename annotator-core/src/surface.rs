//! The drawing surface: responsive dimensions plus an ordered object list.

use serde::{Deserialize, Serialize};

use crate::{EditorError, EditorResult, Object, ObjectId};

/// Viewport width below which the surface follows the viewport.
const NARROW_VIEWPORT_WIDTH: f32 = 800.0;

/// Viewport height below which the surface follows the viewport.
const SHORT_VIEWPORT_HEIGHT: f32 = 600.0;

/// Fraction of a narrow viewport's width the surface takes.
const NARROW_WIDTH_FRACTION: f32 = 0.9;

/// Fraction of a short viewport's height the surface takes.
const SHORT_HEIGHT_FRACTION: f32 = 0.5;

/// Surface width on wide viewports.
const FIXED_WIDTH: f32 = 700.0;

/// Surface height on tall viewports.
const FIXED_HEIGHT: f32 = 500.0;

/// Size of the host window in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width.
    pub width: f32,
    /// Viewport height.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Surface dimensions for this viewport.
    ///
    /// Narrow viewports get 90% of their width, short ones 50% of their
    /// height; otherwise the surface is a fixed 700x500.
    #[must_use]
    pub fn surface_size(self) -> (f32, f32) {
        let width = if self.width < NARROW_VIEWPORT_WIDTH {
            self.width * NARROW_WIDTH_FRACTION
        } else {
            FIXED_WIDTH
        };
        let height = if self.height < SHORT_VIEWPORT_HEIGHT {
            self.height * SHORT_HEIGHT_FRACTION
        } else {
            FIXED_HEIGHT
        };
        (width, height)
    }
}

/// The drawing area and its objects in paint order.
///
/// Index 0 paints first. A background image, when present, is always at
/// index 0.
#[derive(Debug, Clone, Serialize)]
pub struct Surface {
    /// Surface width in pixels.
    width: f32,
    /// Surface height in pixels.
    height: f32,
    /// Objects in paint order.
    objects: Vec<Object>,
    /// Object that currently has focus, if any.
    active: Option<ObjectId>,
    /// Number of repaints requested since construction.
    repaints: u64,
}

impl Surface {
    /// Create an empty surface sized for the given viewport.
    #[must_use]
    pub fn for_viewport(viewport: Viewport) -> Self {
        let (width, height) = viewport.surface_size();
        Self {
            width,
            height,
            objects: Vec::new(),
            active: None,
            repaints: 0,
        }
    }

    /// Surface width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Surface height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Re-derive the dimensions from a new viewport. Objects are left where
    /// they are, even if they now fall outside the bounds.
    pub fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.surface_size();
        self.width = width;
        self.height = height;
        self.request_repaint();
    }

    /// Objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Number of objects on the surface.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Check if the surface has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The background image object, if one is loaded.
    #[must_use]
    pub fn background(&self) -> Option<&Object> {
        self.objects.first().filter(|o| o.is_background())
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Append an overlay on top of everything else.
    pub fn push(&mut self, object: Object) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        self.request_repaint();
        id
    }

    /// Place a background image at the bottom of the paint order, replacing
    /// any existing one.
    pub fn set_background(&mut self, object: Object) -> ObjectId {
        let id = object.id;
        self.objects.retain(|o| !o.is_background());
        self.objects.insert(0, object);
        self.request_repaint();
        id
    }

    /// Remove every object and drop the focus.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
        self.request_repaint();
    }

    /// Currently focused object.
    #[must_use]
    pub fn active(&self) -> Option<&Object> {
        self.active.and_then(|id| self.get(id))
    }

    /// Focus an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or not selectable.
    pub fn set_active(&mut self, id: ObjectId) -> EditorResult<()> {
        let object = self
            .get(id)
            .ok_or_else(|| EditorError::ObjectNotFound(id.to_string()))?;
        if !object.selectable {
            return Err(EditorError::InvalidOperation(format!(
                "{} object {id} is not selectable",
                object.kind.type_name()
            )));
        }
        self.active = Some(id);
        self.request_repaint();
        Ok(())
    }

    /// Drop the focus.
    pub fn discard_active(&mut self) {
        if self.active.take().is_some() {
            self.request_repaint();
        }
    }

    /// Topmost selectable object containing the point.
    #[must_use]
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.selectable && o.contains_point(x, y))
            .map(|o| o.id)
    }

    /// Mark the surface as needing a repaint.
    pub fn request_repaint(&mut self) {
        self.repaints += 1;
    }

    /// Number of repaints requested so far.
    #[must_use]
    pub fn repaint_count(&self) -> u64 {
        self.repaints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectKind, Raster, Shape};

    fn rect(left: f32, top: f32) -> Object {
        Object::new(ObjectKind::Shape(Shape::Rectangle {
            width: 100.0,
            height: 70.0,
            fill: "blue".to_string(),
        }))
        .at(left, top)
    }

    fn background() -> Object {
        let raster = Raster::new(2, 2, vec![255; 16]).expect("raster");
        Object::new(ObjectKind::Image {
            src: "bg.png".to_string(),
            raster,
        })
        .with_selectable(false)
    }

    #[test]
    fn sizing_rule_on_wide_viewport() {
        assert_eq!(Viewport::new(1200.0, 900.0).surface_size(), (700.0, 500.0));
    }

    #[test]
    fn sizing_rule_on_small_viewport() {
        let (w, h) = Viewport::new(400.0, 300.0).surface_size();
        assert!((w - 360.0).abs() < 1e-4);
        assert!((h - 150.0).abs() < 1e-4);
    }

    #[test]
    fn sizing_rule_boundaries_are_fixed() {
        assert_eq!(Viewport::new(800.0, 600.0).surface_size(), (700.0, 500.0));
    }

    #[test]
    fn resize_keeps_objects_in_place() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        let id = surface.push(rect(600.0, 450.0));
        surface.resize(Viewport::new(500.0, 400.0));

        assert!((surface.width() - 450.0).abs() < 1e-4);
        assert!((surface.height() - 200.0).abs() < 1e-4);
        let object = surface.get(id).expect("object");
        assert_eq!((object.left, object.top), (600.0, 450.0));
    }

    #[test]
    fn background_is_pinned_to_bottom() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        surface.push(rect(0.0, 0.0));
        let bg = surface.set_background(background());

        assert_eq!(surface.objects()[0].id, bg);
        assert_eq!(surface.background().map(|o| o.id), Some(bg));
    }

    #[test]
    fn background_cannot_be_focused() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        let bg = surface.set_background(background());
        assert!(surface.set_active(bg).is_err());
        assert!(surface.active().is_none());
    }

    #[test]
    fn object_at_prefers_topmost() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        surface.set_background(background().with_scale(500.0, 500.0));
        let _lower = surface.push(rect(0.0, 0.0));
        let upper = surface.push(rect(50.0, 50.0));

        assert_eq!(surface.object_at(60.0, 60.0), Some(upper));
        // Background is hit but not selectable
        assert_eq!(surface.object_at(400.0, 400.0), None);
    }

    #[test]
    fn clear_drops_focus() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        let id = surface.push(rect(0.0, 0.0));
        surface.set_active(id).expect("focus");
        surface.clear();
        assert!(surface.is_empty());
        assert!(surface.active().is_none());
    }
}
