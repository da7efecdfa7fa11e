//! Centralized default constants for ideacap.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// TITLES
// =============================================================================

/// Maximum characters of content used for a derived title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Suffix appended to a derived title when content was truncated.
pub const TITLE_ELLIPSIS: &str = "...";

/// Title used when content is empty after trimming.
pub const TITLE_PLACEHOLDER: &str = "Untitled idea";

// =============================================================================
// IMAGE NORMALIZATION
// =============================================================================

/// Byte budget for images sent to the completion endpoint and remote store.
pub const IMAGE_MAX_BYTES: usize = 500 * 1024;

/// First JPEG quality attempted, in tenths (0.8).
pub const IMAGE_START_QUALITY_TENTHS: u8 = 8;

/// Lowest JPEG quality attempted, in tenths (0.1).
pub const IMAGE_MIN_QUALITY_TENTHS: u8 = 1;

/// MIME type of normalized images.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

// =============================================================================
// COMPLETION SERVICE
// =============================================================================

/// Default completion service base URL.
pub const COMPLETION_BASE_URL: &str = "https://space.ai-builders.com/backend";

/// Default completion model.
pub const COMPLETION_MODEL: &str = "gemini-2.5-pro";

/// Default request timeout for the completion service, in seconds.
/// Vision transcription on large images is slow; keep this generous.
pub const COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Path of the chat completion endpoint relative to the base URL.
pub const COMPLETION_PATH: &str = "/v1/chat/completions";

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Storage bucket holding idea images.
pub const IMAGE_BUCKET: &str = "idea-images";

/// REST table holding idea records.
pub const IDEAS_TABLE: &str = "ideas";

/// Upsert directive for record uploads.
pub const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Default request timeout for the remote store, in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Default directory for the file-backed idea store.
pub const DATA_DIR: &str = "./ideacap-data";

// =============================================================================
// EVENTS
// =============================================================================

/// Capture event channel capacity.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
