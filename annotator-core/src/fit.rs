//! Aspect-preserving fit-and-center placement of a photo on the surface.

use serde::Serialize;

/// Where and how large a photo is drawn on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Uniform scale factor applied on both axes.
    pub scale: f32,
    /// Left offset of the drawn photo.
    pub left: f32,
    /// Top offset of the drawn photo.
    pub top: f32,
    /// Drawn width (`image_width * scale`).
    pub width: f32,
    /// Drawn height (`image_height * scale`).
    pub height: f32,
}

/// Fit an `image_width` x `image_height` photo inside the surface.
///
/// The smaller of the two axis ratios is used so the photo never overflows
/// either dimension, and the leftover space is split evenly on both sides.
/// Photos smaller than the surface are scaled up.
#[must_use]
pub fn fit_and_center(
    surface_width: f32,
    surface_height: f32,
    image_width: f32,
    image_height: f32,
) -> Placement {
    let scale = (surface_width / image_width).min(surface_height / image_height);
    let width = image_width * scale;
    let height = image_height * scale;
    Placement {
        scale,
        left: (surface_width - width) / 2.0,
        top: (surface_height - height) / 2.0,
        width,
        height,
    }
}
