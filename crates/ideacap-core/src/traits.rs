//! Core traits for ideacap abstractions.
//!
//! These traits define the seams between the capture pipeline and its
//! collaborators, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Sort order for listing ideas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaSort {
    /// Newest first.
    #[default]
    CreatedDesc,
    CreatedAsc,
    /// Most recently edited first.
    UpdatedDesc,
}

impl IdeaSort {
    /// Sort a slice of ideas in place.
    pub fn apply(self, ideas: &mut [Idea]) {
        match self {
            IdeaSort::CreatedDesc => ideas.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            IdeaSort::CreatedAsc => ideas.sort_by_key(|i| i.created_at()),
            IdeaSort::UpdatedDesc => ideas.sort_by(|a, b| b.updated_at().cmp(&a.updated_at())),
        }
    }
}

/// Local persistence for ideas, keyed by identifier.
///
/// Writes are treated as synchronous and atomic by callers.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Insert a new idea. Fails with `InvalidInput` if the id exists.
    async fn insert(&self, idea: &Idea) -> Result<()>;

    /// Fetch an idea by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<Idea>>;

    /// Replace an existing idea. Fails with `NotFound` if absent.
    async fn update(&self, idea: &Idea) -> Result<()>;

    /// Replace an idea only if the stored copy's `updated_at` still equals
    /// `expected_updated_at`. The check and the write are one atomic step.
    /// Returns `false` without writing when the idea is absent or changed.
    async fn update_if_unchanged(
        &self,
        idea: &Idea,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Delete an idea. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// List all ideas in the given order.
    async fn list(&self, sort: IdeaSort) -> Result<Vec<Idea>>;
}

// =============================================================================
// COMPLETION
// =============================================================================

/// AI completion service producing OCR text and tag suggestions.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Transcribe handwritten text in a JPEG image.
    async fn recognize_text(&self, image_data: &[u8]) -> Result<String>;

    /// Suggest tags for content. Unparseable model output yields `[]`.
    async fn recommend_tags(&self, content: &str) -> Result<Vec<String>>;

    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;
}

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Remote backend holding the canonical synced copy of ideas.
///
/// Uploads are upserts keyed by the client-assigned identifier, so repeating
/// an upload converges to the same remote state.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether the remote URL and key are both present.
    fn is_configured(&self) -> bool;

    /// Upload one idea (and its image, if any) and return the remote id.
    async fn upload_idea(&self, idea: &Idea) -> Result<String> {
        Ok(self.upload_idea_detailed(idea).await?.remote_id)
    }

    /// Upload one idea, returning the remote id and image URL.
    async fn upload_idea_detailed(&self, idea: &Idea) -> Result<UploadOutcome>;

    /// Upload ideas in order, isolating per-item failures.
    async fn upload_ideas_with_report(&self, ideas: &[Idea]) -> Result<BatchReport>;

    /// Upload ideas in order and return how many succeeded.
    async fn upload_ideas(&self, ideas: &[Idea]) -> Result<usize> {
        Ok(self.upload_ideas_with_report(ideas).await?.success_count())
    }

    /// Fetch every remote record.
    async fn fetch_all_ideas(&self) -> Result<Vec<RemoteIdeaRecord>>;

    /// Delete the remote record with the given wire id.
    async fn delete_idea(&self, id: &str) -> Result<()>;
}
