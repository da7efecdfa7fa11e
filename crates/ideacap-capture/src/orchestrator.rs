//! Capture orchestration: normalize, recognize, tag, save, then sync in the background.
//!
//! The orchestrator drives one capture at a time through
//! `Idle -> Normalizing -> Recognizing -> Tagging -> Idle`. A failure at any
//! step sets the error overlay and returns to `Idle`, keeping whatever was
//! computed before it. Progress is published as [`CaptureEvent`]s and the
//! current state can be read at any time with [`CaptureOrchestrator::snapshot`].

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ideacap_core::defaults::{EVENT_CHANNEL_CAPACITY, IMAGE_MAX_BYTES};
use ideacap_core::{CompletionBackend, Error, Idea, IdeaStore, RemoteStore, Result};

use crate::normalize::{normalize, QualityEncoder};
use crate::sync::record_synced;

/// Step of the capture pipeline currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Normalizing,
    Recognizing,
    Tagging,
}

/// Observable state of the current capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSnapshot {
    pub phase: CapturePhase,
    pub recognized_text: String,
    pub tags: Vec<String>,
    pub normalized_image: Option<Vec<u8>>,
    /// Set when a step failed; cleared when a new capture starts.
    pub error: Option<String>,
}

impl CaptureSnapshot {
    pub fn is_busy(&self) -> bool {
        self.phase != CapturePhase::Idle
    }

    pub fn has_text(&self) -> bool {
        !self.recognized_text.trim().is_empty()
    }
}

/// Progress notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    PhaseChanged(CapturePhase),
    TextRecognized(String),
    TagsRecommended(Vec<String>),
    Failed(String),
    Saved(Uuid),
    Synced(Uuid),
    SyncFailed { id: Uuid, error: String },
}

/// Sequences the capture pipeline over its collaborators.
pub struct CaptureOrchestrator {
    completion: Arc<dyn CompletionBackend>,
    remote: Arc<dyn RemoteStore>,
    store: Arc<dyn IdeaStore>,
    state: RwLock<CaptureSnapshot>,
    events: broadcast::Sender<CaptureEvent>,
    max_image_bytes: usize,
}

impl CaptureOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        remote: Arc<dyn RemoteStore>,
        store: Arc<dyn IdeaStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            completion,
            remote,
            store,
            state: RwLock::new(CaptureSnapshot::default()),
            events,
            max_image_bytes: IMAGE_MAX_BYTES,
        }
    }

    /// Override the normalized image byte budget.
    pub fn with_max_image_bytes(mut self, max_bytes: usize) -> Self {
        self.max_image_bytes = max_bytes;
        self
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    /// Current capture state.
    pub async fn snapshot(&self) -> CaptureSnapshot {
        self.state.read().await.clone()
    }

    /// Discard the current capture.
    pub async fn reset(&self) {
        *self.state.write().await = CaptureSnapshot::default();
        self.emit(CaptureEvent::PhaseChanged(CapturePhase::Idle));
    }

    fn emit(&self, event: CaptureEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn enter(&self, phase: CapturePhase) {
        self.state.write().await.phase = phase;
        self.emit(CaptureEvent::PhaseChanged(phase));
    }

    /// Set the error overlay and abort back to idle.
    async fn fail(&self, error: Error) -> Error {
        let message = error.to_string();
        {
            let mut state = self.state.write().await;
            state.error = Some(message.clone());
            state.phase = CapturePhase::Idle;
        }
        warn!(error = %message, "Capture step failed");
        self.emit(CaptureEvent::Failed(message));
        self.emit(CaptureEvent::PhaseChanged(CapturePhase::Idle));
        error
    }

    /// Run a new capture from a raw image.
    ///
    /// Tagging is skipped when no text was recognized. On failure the
    /// partial results stay in the snapshot and the error is returned.
    #[instrument(skip(self, image), fields(subsystem = "capture", component = "orchestrator", op = "process_image"))]
    pub async fn process_image(&self, image: &dyn QualityEncoder) -> Result<CaptureSnapshot> {
        let start = Instant::now();
        *self.state.write().await = CaptureSnapshot {
            phase: CapturePhase::Normalizing,
            ..CaptureSnapshot::default()
        };
        self.emit(CaptureEvent::PhaseChanged(CapturePhase::Normalizing));

        let normalized = match normalize(image, self.max_image_bytes) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(e).await),
        };
        debug!(image_bytes = normalized.len(), "Image ready for recognition");
        self.state.write().await.normalized_image = Some(normalized.clone());

        self.enter(CapturePhase::Recognizing).await;
        let text = match self.completion.recognize_text(&normalized).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(e).await),
        };
        self.state.write().await.recognized_text = text.clone();
        self.emit(CaptureEvent::TextRecognized(text.clone()));

        if text.trim().is_empty() {
            debug!("No text recognized, skipping tagging");
        } else {
            self.run_tagging(&text).await?;
        }

        self.enter(CapturePhase::Idle).await;
        let snapshot = self.snapshot().await;
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            text_len = snapshot.recognized_text.len(),
            tag_count = snapshot.tags.len(),
            "Capture processed"
        );
        Ok(snapshot)
    }

    /// Re-run tag recommendation for the current text.
    pub async fn recommend_tags_for_current_text(&self) -> Result<Vec<String>> {
        let text = self.state.read().await.recognized_text.clone();
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.state.write().await.error = None;
        let tags = self.run_tagging(&text).await?;
        self.enter(CapturePhase::Idle).await;
        Ok(tags)
    }

    async fn run_tagging(&self, text: &str) -> Result<Vec<String>> {
        self.enter(CapturePhase::Tagging).await;
        match self.completion.recommend_tags(text).await {
            Ok(tags) => {
                self.state.write().await.tags = tags.clone();
                self.emit(CaptureEvent::TagsRecommended(tags.clone()));
                Ok(tags)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Persist the current capture as a new idea and start a background upload.
    ///
    /// The save succeeds once the idea is stored locally. The returned handle
    /// belongs to the detached upload; awaiting it is optional.
    #[instrument(skip(self, custom_title), fields(subsystem = "capture", component = "orchestrator", op = "save"))]
    pub async fn save(&self, custom_title: Option<&str>) -> Result<(Idea, JoinHandle<()>)> {
        let snapshot = self.snapshot().await;
        if !snapshot.has_text() {
            return Err(Error::EmptyContent);
        }

        let idea = Idea::new(
            custom_title,
            snapshot.recognized_text,
            snapshot.tags,
            snapshot.normalized_image,
        );
        self.store.insert(&idea).await?;
        info!(idea_id = %idea.id(), title = %idea.title(), "Idea saved");
        self.emit(CaptureEvent::Saved(idea.id()));

        *self.state.write().await = CaptureSnapshot::default();

        let handle = tokio::spawn(sync_in_background(
            Arc::clone(&self.remote),
            Arc::clone(&self.store),
            self.events.clone(),
            idea.clone(),
        ));
        Ok((idea, handle))
    }
}

/// Upload one freshly saved idea. Never fails; outcomes are logged and
/// published as events.
async fn sync_in_background(
    remote: Arc<dyn RemoteStore>,
    store: Arc<dyn IdeaStore>,
    events: broadcast::Sender<CaptureEvent>,
    mut idea: Idea,
) {
    let id = idea.id();
    if !remote.is_configured() {
        info!(idea_id = %id, "Remote store not configured, skipping background sync");
        return;
    }

    idea.begin_sync();
    match remote.upload_idea_detailed(&idea).await {
        Ok(outcome) => {
            let recorded =
                record_synced(store.as_ref(), &idea, outcome.remote_id, outcome.image_url).await;
            if let Err(e) = recorded {
                warn!(idea_id = %id, error = %e, "Failed to record sync state");
            }
            info!(idea_id = %id, "Background sync complete");
            let _ = events.send(CaptureEvent::Synced(id));
        }
        Err(e) => {
            // Store still holds the idea as unsynced for the next pass.
            warn!(idea_id = %id, error = %e, "Background sync failed");
            let _ = events.send(CaptureEvent::SyncFailed {
                id,
                error: e.to_string(),
            });
        }
    }
}
