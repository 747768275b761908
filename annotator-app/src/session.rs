//! Editor session task.
//!
//! One task owns the [`Editor`], the viewport listener and every in-flight
//! photo load. Callers talk to it through an [`EditorHandle`]; load progress
//! is published on a watch channel as [`EditorEvent`]s.
//!
//! ```text
//! EditorHandle ──commands──▶ ┌───────────────┐ ──events──▶ watch::Receiver
//! viewport watch ──────────▶ │ EditorSession │
//! JoinSet<load> ───────────▶ └───────────────┘
//! ```
//!
//! Dropping the session (all handles gone, or the task aborted) tears the
//! editor down, publishes [`EditorEvent::Closed`] and releases the viewport
//! listener.

use std::sync::Arc;

use annotator_core::{
    Editor, EditorError, EditorResult, ImageDescriptor, LayerSnapshot, LoadTicket, ObjectId,
    Placement, Raster, ShapeKind, Viewport,
};
use annotator_renderer::{
    decode_data_uri, decode_photo, ExportArtifact, RenderError, SurfaceExporter,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::fetch::ImageFetcher;

const COMMAND_BUFFER: usize = 32;

/// Errors surfaced to [`EditorHandle`] callers.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task is gone.
    #[error("editor session closed")]
    Closed,
    /// The editor rejected the operation.
    #[error(transparent)]
    Editor(#[from] EditorError),
    /// Export failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Load lifecycle as seen from outside the session.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// No load has been started.
    Idle,
    /// A load was started and is waiting for its pixels.
    Loading {
        /// Load generation.
        generation: u64,
    },
    /// The photo for `generation` is on the surface.
    ImageReady {
        /// Load generation.
        generation: u64,
        /// Where the photo was placed.
        placement: Placement,
    },
    /// The load for `generation` failed; the surface has no background.
    LoadFailed {
        /// Load generation.
        generation: u64,
        /// Human readable failure.
        reason: String,
    },
    /// The session was torn down.
    Closed,
}

impl EditorEvent {
    /// Load generation this event refers to, if any.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Loading { generation }
            | Self::ImageReady { generation, .. }
            | Self::LoadFailed { generation, .. } => Some(*generation),
            Self::Idle | Self::Closed => None,
        }
    }

    /// Whether this event settles the load for `generation`.
    fn settles(&self, generation: u64) -> bool {
        match self {
            Self::Closed => true,
            Self::ImageReady { generation: g, .. } | Self::LoadFailed { generation: g, .. } => {
                *g >= generation
            }
            Self::Loading { generation: g } => *g > generation,
            Self::Idle => false,
        }
    }
}

/// Requests handled by the session task.
#[derive(Debug)]
pub enum EditorCommand {
    /// Start loading a new background photo.
    SelectImage {
        /// Photo to load.
        descriptor: ImageDescriptor,
        /// Load generation, or `None` without a surface.
        reply: oneshot::Sender<Option<u64>>,
    },
    /// Add the default caption.
    AddText {
        /// New object id.
        reply: oneshot::Sender<Option<ObjectId>>,
    },
    /// Add a default shape.
    AddShape {
        /// Shape to add.
        kind: ShapeKind,
        /// New object id.
        reply: oneshot::Sender<Option<ObjectId>>,
    },
    /// Capture (and log) the layer snapshot.
    Snapshot {
        /// Snapshot, or `None` without a surface.
        reply: oneshot::Sender<Option<LayerSnapshot>>,
    },
    /// Flatten the surface into a PNG.
    Export {
        /// Artifact, or `None` when export is a no-op.
        reply: oneshot::Sender<Result<Option<ExportArtifact>, RenderError>>,
    },
    /// Make an object the active one.
    Select {
        /// Object to select.
        id: ObjectId,
        /// Outcome.
        reply: oneshot::Sender<EditorResult<()>>,
    },
    /// Drop the active object.
    Deselect,
    /// Topmost selectable object under a point.
    ObjectAt {
        /// X in surface pixels.
        x: f32,
        /// Y in surface pixels.
        y: f32,
        /// Hit, if any.
        reply: oneshot::Sender<Option<ObjectId>>,
    },
    /// Move an object's top-left corner.
    MoveObject {
        /// Object to move.
        id: ObjectId,
        /// New left.
        left: f32,
        /// New top.
        top: f32,
        /// Outcome.
        reply: oneshot::Sender<EditorResult<()>>,
    },
    /// Set an object's scale factors.
    ScaleObject {
        /// Object to scale.
        id: ObjectId,
        /// Horizontal factor.
        scale_x: f32,
        /// Vertical factor.
        scale_y: f32,
        /// Outcome.
        reply: oneshot::Sender<EditorResult<()>>,
    },
    /// Replace a caption's content.
    EditText {
        /// Caption to edit.
        id: ObjectId,
        /// New content.
        content: String,
        /// Outcome.
        reply: oneshot::Sender<EditorResult<()>>,
    },
    /// Current surface size.
    SurfaceSize {
        /// `(width, height)`, or `None` without a surface.
        reply: oneshot::Sender<Option<(f32, f32)>>,
    },
}

type LoadOutcome = (LoadTicket, EditorResult<Raster>);

/// The task that owns an [`Editor`].
pub struct EditorSession {
    editor: Editor,
    viewport: watch::Receiver<Viewport>,
    commands: mpsc::Receiver<EditorCommand>,
    events: watch::Sender<EditorEvent>,
    stale: watch::Sender<u64>,
    fetcher: Arc<dyn ImageFetcher>,
    exporter: SurfaceExporter,
    loads: JoinSet<LoadOutcome>,
}

impl EditorSession {
    /// Create a session listening to `viewport` and a handle to drive it.
    #[must_use]
    pub fn new(
        viewport: watch::Receiver<Viewport>,
        fetcher: Arc<dyn ImageFetcher>,
        exporter: SurfaceExporter,
    ) -> (Self, EditorHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = watch::channel(EditorEvent::Idle);
        let (stale_tx, stale_rx) = watch::channel(0);
        let session = Self {
            editor: Editor::new(),
            viewport,
            commands: command_rx,
            events: event_tx,
            stale: stale_tx,
            fetcher,
            exporter,
            loads: JoinSet::new(),
        };
        let handle = EditorHandle {
            commands: command_tx,
            events: event_rx,
            stale: stale_rx,
        };
        (session, handle)
    }

    /// Run until every [`EditorHandle`] is dropped.
    pub async fn run(mut self) {
        let initial = *self.viewport.borrow_and_update();
        self.editor.initialize(initial);
        let mut viewport_open = true;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                changed = self.viewport.changed(), if viewport_open => {
                    if changed.is_ok() {
                        let viewport = *self.viewport.borrow_and_update();
                        self.editor.resize(viewport);
                    } else {
                        tracing::debug!("Viewport source closed; surface size is now fixed");
                        viewport_open = false;
                    }
                }
                Some(joined) = self.loads.join_next(), if !self.loads.is_empty() => {
                    match joined {
                        Ok((ticket, fetched)) => self.apply_load(&ticket, fetched),
                        Err(e) => tracing::error!("Load task failed: {}", e),
                    }
                }
            }
        }

        tracing::debug!("All editor handles dropped");
    }

    fn handle(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::SelectImage { descriptor, reply } => {
                let generation = self.select_image(&descriptor);
                let _ = reply.send(generation);
            }
            EditorCommand::AddText { reply } => {
                let _ = reply.send(self.editor.add_text());
            }
            EditorCommand::AddShape { kind, reply } => {
                let _ = reply.send(self.editor.add_shape(kind));
            }
            EditorCommand::Snapshot { reply } => {
                let snapshot = self.editor.snapshot();
                if let Some(snapshot) = &snapshot {
                    match snapshot.to_json() {
                        Ok(json) => tracing::info!("Layer snapshot: {}", json),
                        Err(e) => tracing::warn!("Failed to serialize snapshot: {}", e),
                    }
                }
                let _ = reply.send(snapshot);
            }
            EditorCommand::Export { reply } => {
                let _ = reply.send(self.exporter.export(&self.editor));
            }
            EditorCommand::Select { id, reply } => {
                let _ = reply.send(self.editor.select(id));
            }
            EditorCommand::Deselect => self.editor.deselect(),
            EditorCommand::ObjectAt { x, y, reply } => {
                let _ = reply.send(self.editor.object_at(x, y));
            }
            EditorCommand::MoveObject {
                id,
                left,
                top,
                reply,
            } => {
                let _ = reply.send(self.editor.move_object(id, left, top));
            }
            EditorCommand::ScaleObject {
                id,
                scale_x,
                scale_y,
                reply,
            } => {
                let _ = reply.send(self.editor.scale_object(id, scale_x, scale_y));
            }
            EditorCommand::EditText { id, content, reply } => {
                let _ = reply.send(self.editor.edit_text(id, &content));
            }
            EditorCommand::SurfaceSize { reply } => {
                let size = self.editor.surface().map(|s| (s.width(), s.height()));
                let _ = reply.send(size);
            }
        }
    }

    fn select_image(&mut self, descriptor: &ImageDescriptor) -> Option<u64> {
        let ticket = self.editor.begin_load(descriptor)?;
        let generation = self.editor.load_generation();
        self.events.send_replace(EditorEvent::Loading { generation });

        let fetcher = Arc::clone(&self.fetcher);
        self.loads.spawn(async move {
            let fetched = load_raster(fetcher.as_ref(), ticket.url()).await;
            (ticket, fetched)
        });
        Some(generation)
    }

    fn apply_load(&mut self, ticket: &LoadTicket, fetched: EditorResult<Raster>) {
        let generation = ticket.generation();
        match self.editor.finish_load(ticket, fetched) {
            Ok(placement) => {
                self.events.send_replace(EditorEvent::ImageReady {
                    generation,
                    placement,
                });
            }
            Err(EditorError::StaleLoad { current, .. }) => {
                self.stale.send_modify(|dropped| *dropped += 1);
                tracing::debug!(
                    "Dropped load {} for {}: superseded by {}",
                    generation,
                    ticket.url(),
                    current
                );
            }
            Err(EditorError::PreconditionNotMet(reason)) => {
                tracing::debug!("Dropped load {}: {}", generation, reason);
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", ticket.url(), e);
                self.events.send_replace(EditorEvent::LoadFailed {
                    generation,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.loads.abort_all();
        self.editor.teardown();
        self.events.send_replace(EditorEvent::Closed);
        tracing::debug!("Editor session torn down");
    }
}

/// Fetch and decode the pixels behind `url`.
async fn load_raster(fetcher: &dyn ImageFetcher, url: &str) -> EditorResult<Raster> {
    if url.starts_with("data:") {
        return Ok(decode_data_uri(url)?);
    }
    let bytes = fetcher
        .fetch(url)
        .await
        .map_err(|e| EditorError::ImageLoad(e.to_string()))?;
    Ok(decode_photo(&bytes)?)
}

/// Cloneable handle to a running [`EditorSession`].
#[derive(Clone)]
pub struct EditorHandle {
    commands: mpsc::Sender<EditorCommand>,
    events: watch::Receiver<EditorEvent>,
    stale: watch::Receiver<u64>,
}

impl EditorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EditorCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Start loading `descriptor` as the background photo.
    ///
    /// Returns the load generation to pass to [`EditorHandle::wait_for_load`],
    /// or `None` if the editor has no surface.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn select_image(
        &self,
        descriptor: ImageDescriptor,
    ) -> Result<Option<u64>, SessionError> {
        self.request(|reply| EditorCommand::SelectImage { descriptor, reply })
            .await
    }

    /// Add the default caption.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn add_text(&self) -> Result<Option<ObjectId>, SessionError> {
        self.request(|reply| EditorCommand::AddText { reply }).await
    }

    /// Add a default shape.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn add_shape(&self, kind: ShapeKind) -> Result<Option<ObjectId>, SessionError> {
        self.request(|reply| EditorCommand::AddShape { kind, reply })
            .await
    }

    /// Capture the layer snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn snapshot(&self) -> Result<Option<LayerSnapshot>, SessionError> {
        self.request(|reply| EditorCommand::Snapshot { reply }).await
    }

    /// Flatten the surface into a PNG.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Render`] if rendering fails.
    pub async fn export(&self) -> Result<Option<ExportArtifact>, SessionError> {
        Ok(self.request(|reply| EditorCommand::Export { reply }).await??)
    }

    /// Make `id` the active object.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Editor`] if the object is missing or locked.
    pub async fn select(&self, id: ObjectId) -> Result<(), SessionError> {
        Ok(self
            .request(|reply| EditorCommand::Select { id, reply })
            .await??)
    }

    /// Drop the active object.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn deselect(&self) -> Result<(), SessionError> {
        self.commands
            .send(EditorCommand::Deselect)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Topmost selectable object under `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn object_at(&self, x: f32, y: f32) -> Result<Option<ObjectId>, SessionError> {
        self.request(|reply| EditorCommand::ObjectAt { x, y, reply })
            .await
    }

    /// Move an object's top-left corner.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Editor`] if the object is missing or locked.
    pub async fn move_object(&self, id: ObjectId, left: f32, top: f32) -> Result<(), SessionError> {
        Ok(self
            .request(|reply| EditorCommand::MoveObject {
                id,
                left,
                top,
                reply,
            })
            .await??)
    }

    /// Set an object's scale factors.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Editor`] for missing or locked objects and
    /// non-positive factors.
    pub async fn scale_object(
        &self,
        id: ObjectId,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<(), SessionError> {
        Ok(self
            .request(|reply| EditorCommand::ScaleObject {
                id,
                scale_x,
                scale_y,
                reply,
            })
            .await??)
    }

    /// Replace a caption's content.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Editor`] if `id` is not an editable caption.
    pub async fn edit_text(&self, id: ObjectId, content: impl Into<String>) -> Result<(), SessionError> {
        let content = content.into();
        Ok(self
            .request(|reply| EditorCommand::EditText { id, content, reply })
            .await??)
    }

    /// Current surface size.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is gone.
    pub async fn surface_size(&self) -> Result<Option<(f32, f32)>, SessionError> {
        self.request(|reply| EditorCommand::SurfaceSize { reply })
            .await
    }

    /// Most recent load event.
    #[must_use]
    pub fn current_event(&self) -> EditorEvent {
        self.events.borrow().clone()
    }

    /// Subscribe to load events.
    #[must_use]
    pub fn events(&self) -> watch::Receiver<EditorEvent> {
        self.events.clone()
    }

    /// Running count of load completions discarded as superseded.
    #[must_use]
    pub fn stale_completions(&self) -> watch::Receiver<u64> {
        self.stale.clone()
    }

    /// Wait until the load for `generation` settles.
    ///
    /// Resolves with [`EditorEvent::ImageReady`] or [`EditorEvent::LoadFailed`]
    /// for that generation, with a newer generation's event if it was
    /// superseded, or with [`EditorEvent::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session vanished without
    /// publishing a settling event.
    pub async fn wait_for_load(&self, generation: u64) -> Result<EditorEvent, SessionError> {
        let mut events = self.events.clone();
        let event = events
            .wait_for(|event| event.settles(generation))
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(event.clone())
    }
}

/// Spawn an [`EditorSession`] on the current runtime.
#[must_use]
pub fn spawn_editor(
    viewport: watch::Receiver<Viewport>,
    fetcher: Arc<dyn ImageFetcher>,
    exporter: SurfaceExporter,
) -> (EditorHandle, JoinHandle<()>) {
    let (session, handle) = EditorSession::new(viewport, fetcher, exporter);
    let task = tokio::spawn(session.run());
    (handle, task)
}
