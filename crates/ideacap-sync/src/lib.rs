//! # ideacap-sync
//!
//! Pushes ideas to a hosted remote store and reads them back.
//!
//! The remote exposes an object-storage API for images and a REST
//! collection for records. [`RemoteSyncEngine`] implements
//! [`RemoteStore`](ideacap_core::RemoteStore) on top of the shared
//! [`Transport`](ideacap_core::Transport) seam:
//!
//! - images are PUT to `idea-images/{id}.jpg` with overwrite enabled and
//!   referenced by their public URL
//! - records are POSTed with a merge-duplicates upsert, so re-uploading
//!   the same idea is idempotent
//! - batch uploads isolate per-item failures and report which ids succeeded

pub mod engine;

pub use engine::RemoteSyncEngine;

// Re-export core types
pub use ideacap_core::{BatchReport, RemoteStore, RemoteStoreConfig, UploadOutcome};
