//! # ideacap-capture
//!
//! Capture pipeline and local persistence for ideacap.
//!
//! This crate wires the completion client and the remote sync engine into
//! the user-facing flows:
//!
//! - [`normalize`]: re-encode images as JPEG within a byte budget
//! - [`CaptureOrchestrator`]: normalize, recognize, tag, save, background upload
//! - [`SyncCoordinator`]: manual and forced sync passes, edits, deletes, pulls
//! - [`MemoryIdeaStore`] and [`JsonFileIdeaStore`]: local [`IdeaStore`]s
//!
//! [`IdeaStore`]: ideacap_core::IdeaStore

pub mod normalize;
pub mod orchestrator;
pub mod store;
pub mod sync;

pub use normalize::{normalize, QualityEncoder, RawImage};
pub use orchestrator::{CaptureEvent, CaptureOrchestrator, CapturePhase, CaptureSnapshot};
pub use store::{JsonFileIdeaStore, MemoryIdeaStore};
pub use sync::{PullSummary, SyncCoordinator, SyncSummary};
