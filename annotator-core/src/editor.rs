//! The editor: surface lifecycle, background loading, overlays and
//! direct manipulation.
//!
//! An [`Editor`] owns at most one [`Surface`]. Everything that needs the
//! surface is a silent no-op until [`Editor::initialize`] has run; hosts gate
//! their controls on [`Editor::is_image_ready`].
//!
//! ## Loading and supersession
//!
//! Loading is split in two so the fetch can happen outside the editor:
//! [`Editor::begin_load`] clears the surface and issues a [`LoadTicket`]
//! stamped with a fresh generation, and [`Editor::finish_load`] applies the
//! fetched pixels. Only the ticket of the latest generation is applied; older
//! tickets are rejected with [`EditorError::StaleLoad`].
//!
//! Finishing a load clears the surface again before placing the photo. Any
//! overlay the user added while the fetch was in flight is therefore wiped
//! when the photo lands. Which overlays survive depends on when the fetch
//! resolves relative to the user's actions; the editor does not reorder
//! them.

use serde::Serialize;

use crate::fit::{fit_and_center, Placement};
use crate::{
    overlay, EditorError, EditorResult, ImageDescriptor, LayerSnapshot, Object, ObjectId,
    ObjectKind, Raster, ShapeKind, Surface, Viewport,
};

/// Claim on the current background load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTicket {
    generation: u64,
    url: String,
}

impl LoadTicket {
    /// Generation this ticket was issued for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Full-resolution URL to fetch.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Editor state. One instance per mounted editing view.
#[derive(Debug, Default)]
pub struct Editor {
    surface: Option<Surface>,
    generation: u64,
    image_ready: bool,
}

impl Editor {
    /// Create an editor with no surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the surface for the given viewport.
    ///
    /// Calling this on an editor that already has a surface does nothing.
    pub fn initialize(&mut self, viewport: Viewport) {
        if self.surface.is_some() {
            tracing::debug!("Editor already initialized, keeping existing surface");
            return;
        }
        let surface = Surface::for_viewport(viewport);
        tracing::info!(
            "Surface created at {}x{} for viewport {}x{}",
            surface.width(),
            surface.height(),
            viewport.width,
            viewport.height
        );
        self.surface = Some(surface);
    }

    /// Whether the surface exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// Re-derive the surface dimensions after a viewport change.
    ///
    /// Returns `false` if there is no surface to resize.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("Resize ignored: no surface");
            return false;
        };
        surface.resize(viewport);
        tracing::debug!(
            "Surface resized to {}x{}",
            surface.width(),
            surface.height()
        );
        true
    }

    /// Release the surface. Pending loads become stale.
    pub fn teardown(&mut self) {
        if self.surface.take().is_some() {
            tracing::info!("Surface released");
        }
        self.generation += 1;
        self.image_ready = false;
    }

    /// The live surface, if initialized.
    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Whether a background photo is on the surface.
    #[must_use]
    pub fn is_image_ready(&self) -> bool {
        self.image_ready
    }

    /// Generation of the most recent load.
    #[must_use]
    pub fn load_generation(&self) -> u64 {
        self.generation
    }

    /// Start loading a new background photo.
    ///
    /// Clears every object, supersedes any load still in flight, and returns
    /// the ticket to pass to [`Editor::finish_load`] once the pixels are
    /// available. Returns `None` before initialization.
    pub fn begin_load(&mut self, descriptor: &ImageDescriptor) -> Option<LoadTicket> {
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("Load of {} ignored: no surface", descriptor.id);
            return None;
        };
        surface.clear();
        self.generation += 1;
        self.image_ready = false;
        tracing::debug!(
            "Load generation {} started for {}",
            self.generation,
            descriptor.full_url
        );
        Some(LoadTicket {
            generation: self.generation,
            url: descriptor.full_url.clone(),
        })
    }

    /// Apply the outcome of a fetch started by [`Editor::begin_load`].
    ///
    /// On success the surface is cleared and the photo is fitted, centered
    /// and pinned as the non-selectable bottom layer.
    ///
    /// # Errors
    ///
    /// - [`EditorError::StaleLoad`] if a newer load has started since the
    ///   ticket was issued; nothing is changed.
    /// - [`EditorError::PreconditionNotMet`] if the surface is gone.
    /// - [`EditorError::ImageLoad`] passing through a failed fetch; the
    ///   surface stays without a background.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        fetched: EditorResult<Raster>,
    ) -> EditorResult<Placement> {
        if ticket.generation != self.generation {
            return Err(EditorError::StaleLoad {
                generation: ticket.generation,
                current: self.generation,
            });
        }
        let surface = self
            .surface
            .as_mut()
            .ok_or(EditorError::PreconditionNotMet("finish_load needs a surface"))?;
        let raster = fetched?;

        #[allow(clippy::cast_precision_loss)]
        let placement = fit_and_center(
            surface.width(),
            surface.height(),
            raster.width() as f32,
            raster.height() as f32,
        );

        surface.clear();
        let background = Object::new(ObjectKind::Image {
            src: ticket.url.clone(),
            raster,
        })
        .at(placement.left, placement.top)
        .with_scale(placement.scale, placement.scale)
        .with_selectable(false);
        surface.set_background(background);
        self.image_ready = true;

        tracing::info!(
            "Background placed at ({}, {}) scale {} drawn {}x{}",
            placement.left,
            placement.top,
            placement.scale,
            placement.width,
            placement.height
        );
        Ok(placement)
    }

    /// Add a caption and focus it so it can be typed into right away.
    pub fn add_text(&mut self) -> Option<ObjectId> {
        let surface = self.live_surface("add_text")?;
        let id = surface.push(overlay::text());
        if let Err(e) = surface.set_active(id) {
            tracing::warn!("Could not focus new caption: {e}");
        }
        Some(id)
    }

    /// Add a shape of the given kind with its defaults.
    pub fn add_shape(&mut self, kind: ShapeKind) -> Option<ObjectId> {
        let surface = self.live_surface("add_shape")?;
        Some(surface.push(overlay::shape(kind)))
    }

    /// Describe the current layers, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Option<LayerSnapshot> {
        let Some(surface) = self.surface.as_ref() else {
            tracing::debug!("snapshot ignored: no surface");
            return None;
        };
        Some(LayerSnapshot::capture(surface))
    }

    /// Focus a selectable object.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no surface, or the object is missing or
    /// not selectable.
    pub fn select(&mut self, id: ObjectId) -> EditorResult<()> {
        self.require_surface("select")?.set_active(id)
    }

    /// Drop the focus, if any.
    pub fn deselect(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.discard_active();
        }
    }

    /// Topmost selectable object under the point.
    #[must_use]
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.surface.as_ref()?.object_at(x, y)
    }

    /// Move an object so its top-left corner is at (`left`, `top`).
    ///
    /// # Errors
    ///
    /// Returns an error if there is no surface, or the object is missing or
    /// not selectable.
    pub fn move_object(&mut self, id: ObjectId, left: f32, top: f32) -> EditorResult<()> {
        let surface = self.require_surface("move_object")?;
        let object = manipulable(surface, id)?;
        object.left = left;
        object.top = top;
        surface.request_repaint();
        Ok(())
    }

    /// Resize an object by setting its scale factors.
    ///
    /// # Errors
    ///
    /// Returns an error if a factor is not a positive finite number, if there
    /// is no surface, or the object is missing or not selectable.
    pub fn scale_object(&mut self, id: ObjectId, scale_x: f32, scale_y: f32) -> EditorResult<()> {
        for factor in [scale_x, scale_y] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(EditorError::InvalidOperation(format!(
                    "scale factor must be positive, got {factor}"
                )));
            }
        }
        let surface = self.require_surface("scale_object")?;
        let object = manipulable(surface, id)?;
        object.scale_x = scale_x;
        object.scale_y = scale_y;
        surface.request_repaint();
        Ok(())
    }

    /// Replace the content of an editable caption.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no surface, the object is missing, or it
    /// is not an editable caption.
    pub fn edit_text(&mut self, id: ObjectId, new_content: &str) -> EditorResult<()> {
        let surface = self.require_surface("edit_text")?;
        let object = manipulable(surface, id)?;
        match &mut object.kind {
            ObjectKind::Text {
                content,
                editable: true,
                ..
            } => {
                new_content.clone_into(content);
            }
            other => {
                return Err(EditorError::InvalidOperation(format!(
                    "{} object {id} has no editable text",
                    other.type_name()
                )));
            }
        }
        surface.request_repaint();
        Ok(())
    }

    fn require_surface(&mut self, op: &'static str) -> EditorResult<&mut Surface> {
        self.surface
            .as_mut()
            .ok_or(EditorError::PreconditionNotMet(op))
    }

    /// Surface for operations that are silent no-ops before initialization.
    fn live_surface(&mut self, op: &'static str) -> Option<&mut Surface> {
        match self.require_surface(op) {
            Ok(surface) => Some(surface),
            Err(e) => {
                tracing::debug!("{e}; ignoring");
                None
            }
        }
    }
}

fn manipulable(surface: &mut Surface, id: ObjectId) -> EditorResult<&mut Object> {
    let object = surface
        .get_mut(id)
        .ok_or_else(|| EditorError::ObjectNotFound(id.to_string()))?;
    if !object.selectable {
        return Err(EditorError::InvalidOperation(format!(
            "{} object {id} is locked",
            object.kind.type_name()
        )));
    }
    Ok(object)
}
