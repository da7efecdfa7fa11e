//! # ideacap-core
//!
//! Core types, traits, and abstractions for the ideacap capture pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the inference, sync and capture crates depend on: the [`Idea`] record
//! and its sync lifecycle, the remote wire shape, the HTTP [`Transport`] seam,
//! configuration loading and the shared error type.

pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod traits;
pub mod transport;

// Re-export commonly used types at crate root
pub use config::{AppConfig, CompletionConfig, ConfigError, RemoteStoreConfig};
pub use error::{Error, Result};
pub use export::{
    to_anki_card, to_anki_qa, to_anki_tsv, to_daily_note_entry, to_markdown, to_obsidian_note,
    AnkiCard, ObsidianNote, ANKI_IMPORT_HEADER,
};
pub use models::*;
pub use traits::*;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
