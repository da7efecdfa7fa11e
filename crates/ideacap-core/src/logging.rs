//! Structured logging field name constants for ideacap.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log queries can filter by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Unrecoverable failure surfaced to the operator |
//! | WARN  | Absorbed failure (background sync, batch item, best-effort delete) |
//! | INFO  | Completed user operations (capture, save, sync pass) |
//! | DEBUG | Request building, decision points, intermediate sizes |
//! | TRACE | Per-attempt detail (image quality steps, parser strategies) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "sync", "capture", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "completion", "tag_parser", "remote_store", "orchestrator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "recognize_text", "upload_idea", "sync_all"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Idea UUID being operated on.
pub const IDEA_ID: &str = "idea_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Size of an image payload in bytes.
pub const IMAGE_BYTES: &str = "image_bytes";

/// Encoding quality in tenths.
pub const QUALITY: &str = "quality";

/// Number of records in a batch.
pub const BATCH_SIZE: &str = "batch_size";

/// Number of successful items in a batch.
pub const SUCCESS_COUNT: &str = "success_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// HTTP status code returned by a remote endpoint.
pub const STATUS: &str = "status";

/// Model name used for completion.
pub const MODEL: &str = "model";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Redact a secret for logging, keeping a short prefix.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "(unset)".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}…", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_keeps_prefix_only() {
        assert_eq!(redact("sk-abcdefgh"), "sk-a…");
        assert_eq!(redact(""), "(unset)");
        assert_eq!(redact("ab"), "ab…");
    }
}
