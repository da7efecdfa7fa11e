//! Core data models for ideacap.
//!
//! [`Idea`] is the persisted record produced by a capture. Its fields are
//! private so that the lifecycle rules hold for every mutation: the
//! identifier never changes, the title is never empty, and any edit of
//! title, content or tags marks the record [`SyncState::Unsynced`] and moves
//! `updated_at` strictly forward.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{TITLE_ELLIPSIS, TITLE_MAX_CHARS, TITLE_PLACEHOLDER};
use crate::error::{Error, Result};

// =============================================================================
// TITLES
// =============================================================================

/// Derive a title from content.
///
/// Uses the first [`TITLE_MAX_CHARS`] characters of the trimmed content,
/// appending [`TITLE_ELLIPSIS`] when truncated, or [`TITLE_PLACEHOLDER`] when
/// the content is blank.
pub fn derive_title(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return TITLE_PLACEHOLDER.to_string();
    }

    match trimmed.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &trimmed[..cut], TITLE_ELLIPSIS),
        None => trimmed.to_string(),
    }
}

// =============================================================================
// SYNC STATE
// =============================================================================

/// Local-vs-remote consistency of an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never uploaded, edited since the last upload, or last upload failed.
    #[default]
    Unsynced,
    /// Upload in flight. Never persisted.
    Syncing,
    /// Remote copy matches the local one.
    Synced,
}

impl SyncState {
    /// State as it should be written to durable storage.
    pub fn persisted(self) -> Self {
        match self {
            SyncState::Syncing => SyncState::Unsynced,
            other => other,
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsynced => write!(f, "unsynced"),
            Self::Syncing => write!(f, "syncing"),
            Self::Synced => write!(f, "synced"),
        }
    }
}

// =============================================================================
// IDEA
// =============================================================================

/// A captured idea: recognized text, suggested tags and an optional image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    id: Uuid,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    image_data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default)]
    sync_state: SyncState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_id: Option<String>,
}

/// A user edit of an idea. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdeaEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl IdeaEdit {
    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

impl Idea {
    /// Create a new, unsynced idea with a fresh identifier.
    ///
    /// A blank `title` is replaced by one derived from `content`.
    pub fn new(
        title: Option<&str>,
        content: impl Into<String>,
        tags: Vec<String>,
        image_data: Option<Vec<u8>>,
    ) -> Self {
        let content = content.into();
        let now = Utc::now();
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => derive_title(&content),
        };

        Self {
            id: Uuid::new_v4(),
            title,
            content,
            tags,
            created_at: now,
            updated_at: now,
            image_data,
            image_url: None,
            sync_state: SyncState::Unsynced,
            remote_id: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Image bytes not yet superseded by a remote URL.
    pub fn image_data(&self) -> Option<&[u8]> {
        self.image_data.as_deref()
    }

    /// Public URL of the uploaded image.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Whether the idea has an image, local or remote.
    pub fn has_image(&self) -> bool {
        self.image_data.is_some() || self.image_url.is_some()
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    /// Whether a non-forced sync pass should upload this idea.
    pub fn needs_sync(&self) -> bool {
        self.sync_state != SyncState::Synced
    }

    /// Tags joined for display.
    pub fn tags_text(&self) -> String {
        self.tags.join(" · ")
    }

    // -------------------------------------------------------------------------
    // User edits
    // -------------------------------------------------------------------------

    /// Replace the title. A blank title falls back to one derived from content.
    pub fn set_title(&mut self, title: &str) {
        let title = title.trim();
        self.title = if title.is_empty() {
            derive_title(&self.content)
        } else {
            title.to_string()
        };
        self.mark_updated();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.mark_updated();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.mark_updated();
    }

    /// Apply a user edit. Content is applied before title so a blank title
    /// derives from the new content. Returns whether anything was applied.
    pub fn apply_edit(&mut self, edit: IdeaEdit) -> bool {
        if edit.is_empty() {
            return false;
        }
        if let Some(content) = edit.content {
            self.content = content;
        }
        if let Some(title) = edit.title {
            let title = title.trim();
            self.title = if title.is_empty() {
                derive_title(&self.content)
            } else {
                title.to_string()
            };
        }
        if let Some(tags) = edit.tags {
            self.tags = tags;
        }
        self.mark_updated();
        true
    }

    /// Refresh `updated_at` and reset the sync state.
    fn mark_updated(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        self.sync_state = SyncState::Unsynced;
    }

    // -------------------------------------------------------------------------
    // Sync transitions
    // -------------------------------------------------------------------------

    /// Enter [`SyncState::Syncing`] for the duration of an upload.
    pub fn begin_sync(&mut self) {
        self.sync_state = SyncState::Syncing;
    }

    /// Record a successful upload. When an image URL is returned it
    /// supersedes the local image bytes.
    pub fn mark_synced(&mut self, remote_id: impl Into<String>, image_url: Option<String>) {
        self.remote_id = Some(remote_id.into());
        if let Some(url) = image_url {
            self.image_url = Some(url);
            self.image_data = None;
        }
        self.sync_state = SyncState::Synced;
    }

    /// Record a failed upload. The idea stays discoverable for the next pass.
    pub fn mark_sync_failed(&mut self) {
        self.sync_state = SyncState::Unsynced;
    }

    /// Copy of this idea with a storable sync state.
    pub fn for_storage(&self) -> Self {
        let mut stored = self.clone();
        stored.sync_state = stored.sync_state.persisted();
        stored
    }

    // -------------------------------------------------------------------------
    // Wire conversion
    // -------------------------------------------------------------------------

    /// Wire identifier shared by the local and remote copies.
    pub fn wire_id(&self) -> String {
        self.id.to_string()
    }

    /// Convert to the remote wire shape.
    pub fn to_remote(&self, image_url: Option<String>) -> RemoteIdeaRecord {
        RemoteIdeaRecord {
            id: self.wire_id(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            created_at: format_timestamp(self.created_at),
            updated_at: format_timestamp(self.updated_at),
            image_data: None,
            image_url,
        }
    }

    /// Build a synced local idea from a fetched remote record.
    pub fn from_remote(record: &RemoteIdeaRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.id)
            .map_err(|e| Error::InvalidInput(format!("invalid idea id {}: {}", record.id, e)))?;
        let created_at = parse_timestamp(&record.created_at)?;
        let updated_at = parse_timestamp(&record.updated_at)?.max(created_at);
        let title = if record.title.trim().is_empty() {
            derive_title(&record.content)
        } else {
            record.title.clone()
        };

        Ok(Self {
            id,
            title,
            content: record.content.clone(),
            tags: record.tags.clone(),
            created_at,
            updated_at,
            image_data: None,
            image_url: record.image_url.clone(),
            sync_state: SyncState::Synced,
            remote_id: Some(record.id.clone()),
        })
    }
}

// =============================================================================
// REMOTE WIRE SHAPE
// =============================================================================

/// Idea as stored in the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIdeaRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Deprecated inline base64 image. Never sent by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Result of a single successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Remote identifier; equal to the local identifier.
    pub remote_id: String,
    /// Public URL of the image sent with the record, if any.
    pub image_url: Option<String>,
}

/// Per-record result of a batch upload, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(Uuid, UploadOutcome)>,
    pub failed: Vec<(Uuid, String)>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Outcome for a given idea, if its upload succeeded.
    pub fn outcome_for(&self, id: Uuid) -> Option<&UploadOutcome> {
        self.succeeded
            .iter()
            .find(|(ok_id, _)| *ok_id == id)
            .map(|(_, outcome)| outcome)
    }
}

/// Format a timestamp as ISO-8601 UTC with second precision.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 timestamp with any offset.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("invalid timestamp {}: {}", s, e)))
}

/// Serde adapter storing optional bytes as a base64 string.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => {
                s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| {
                base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
