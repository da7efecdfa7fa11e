//! # ideacap-inference
//!
//! Completion endpoint client for ideacap.
//!
//! [`CompletionClient`] talks to an OpenAI-compatible chat completion
//! endpoint to transcribe handwriting from JPEG images and to suggest tags
//! for the recognized text. Model output for tags is decoded by the
//! tolerant [`extract_tags`] parser, which never fails.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ideacap_core::{CompletionBackend, CompletionConfig};
//! use ideacap_inference::CompletionClient;
//!
//! let client = CompletionClient::from_config(CompletionConfig::default())?;
//! let text = client.recognize_text(&jpeg_bytes).await?;
//! let tags = client.recommend_tags(&text).await?;
//! ```

pub mod client;
pub mod prompts;
pub mod tags;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{image_data_uri, CompletionClient};
pub use tags::extract_tags;

// Re-export core types
pub use ideacap_core::{CompletionBackend, CompletionConfig, Error, Result};
