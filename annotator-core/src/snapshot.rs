//! Read-only layer descriptions derived from the surface.

use serde::Serialize;

use crate::{EditorError, EditorResult, Object, ObjectKind, Surface};

/// One object's entry in a [`LayerSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRecord {
    /// Type tag (`image`, `text`, `circle`, `rectangle`, `triangle`).
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
    /// Fill color for text and shapes, source reference for the photo.
    pub fill: String,
    /// Content of text objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<&Object> for LayerRecord {
    fn from(object: &Object) -> Self {
        let (width, height) = object.effective_size();
        let (fill, text) = match &object.kind {
            ObjectKind::Image { src, .. } => (src.clone(), None),
            ObjectKind::Text { content, fill, .. } => (fill.clone(), Some(content.clone())),
            ObjectKind::Shape(shape) => (shape.fill().to_string(), None),
        };
        Self {
            kind: object.kind.type_name(),
            left: object.left,
            top: object.top,
            width,
            height,
            fill,
            text,
        }
    }
}

/// Layer records in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LayerSnapshot {
    layers: Vec<LayerRecord>,
}

impl LayerSnapshot {
    /// Describe every object on the surface, bottom layer first.
    #[must_use]
    pub fn capture(surface: &Surface) -> Self {
        Self {
            layers: surface.objects().iter().map(LayerRecord::from).collect(),
        }
    }

    /// The records, bottom layer first.
    #[must_use]
    pub fn layers(&self) -> &[LayerRecord] {
        &self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the snapshot has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Serialize the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string(self).map_err(EditorError::Serialization)
    }
}

impl<'a> IntoIterator for &'a LayerSnapshot {
    type Item = &'a LayerRecord;
    type IntoIter = std::slice::Iter<'a, LayerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlay, ShapeKind, Viewport};

    #[test]
    fn text_record_carries_content() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        surface.push(overlay::text());

        let snapshot = LayerSnapshot::capture(&surface);
        let record = &snapshot.layers()[0];
        assert_eq!(record.kind, "text");
        assert_eq!(record.fill, "black");
        assert_eq!(record.text.as_deref(), Some(overlay::DEFAULT_TEXT));
    }

    #[test]
    fn shape_record_omits_text_in_json() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        surface.push(overlay::shape(ShapeKind::Circle));

        let json = LayerSnapshot::capture(&surface).to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value[0]["type"], "circle");
        assert_eq!(value[0]["width"], 100.0);
        assert_eq!(value[0]["fill"], "red");
        assert!(value[0].get("text").is_none());
    }

    #[test]
    fn capture_does_not_touch_surface() {
        let mut surface = Surface::for_viewport(Viewport::new(1200.0, 900.0));
        surface.push(overlay::shape(ShapeKind::Rectangle));
        let repaints = surface.repaint_count();

        let _ = LayerSnapshot::capture(&surface);
        assert_eq!(surface.repaint_count(), repaints);
        assert_eq!(surface.object_count(), 1);
    }
}
