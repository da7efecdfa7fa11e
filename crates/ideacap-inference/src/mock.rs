//! Scripted completion backend for testing.
//!
//! Returns configured responses without any network traffic and records
//! every call so tests can assert on what the pipeline asked for.
//!
//! # Example
//!
//! ```rust,ignore
//! use ideacap_inference::mock::MockCompletionBackend;
//!
//! let backend = MockCompletionBackend::new()
//!     .with_text("Buy milk")
//!     .with_tags(vec!["errands".into()]);
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ideacap_core::{CompletionBackend, Error, Result};

/// Logged call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    RecognizeText { image_bytes: usize },
    RecommendTags { content: String },
}

#[derive(Debug, Clone)]
struct MockConfig {
    text: String,
    tags: Vec<String>,
    fail_recognize: Option<u16>,
    fail_tags: Option<u16>,
    latency: Duration,
}

/// Completion backend with canned responses.
#[derive(Debug, Clone)]
pub struct MockCompletionBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockCompletionBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig {
                text: String::new(),
                tags: Vec::new(),
                fail_recognize: None,
                fail_tags: None,
                latency: Duration::ZERO,
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Text returned by `recognize_text`.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).text = text.into();
        self
    }

    /// Tags returned by `recommend_tags`.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        Arc::make_mut(&mut self.config).tags = tags;
        self
    }

    /// Make `recognize_text` fail with a remote error of the given status.
    pub fn failing_recognize(mut self, status: u16) -> Self {
        Arc::make_mut(&mut self.config).fail_recognize = Some(status);
        self
    }

    /// Make `recommend_tags` fail with a remote error of the given status.
    pub fn failing_tags(mut self, status: u16) -> Self {
        Arc::make_mut(&mut self.config).fail_tags = Some(status);
        self
    }

    /// Delay every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of tag recommendation calls.
    pub fn tag_call_count(&self) -> usize {
        self.get_calls()
            .iter()
            .filter(|c| matches!(c, MockCall::RecommendTags { .. }))
            .count()
    }

    fn log_call(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn recognize_text(&self, image_data: &[u8]) -> Result<String> {
        self.log_call(MockCall::RecognizeText {
            image_bytes: image_data.len(),
        });
        self.simulate_latency().await;

        match self.config.fail_recognize {
            Some(status) => Err(Error::Remote {
                status,
                body: "simulated failure".to_string(),
            }),
            None => Ok(self.config.text.trim().to_string()),
        }
    }

    async fn recommend_tags(&self, content: &str) -> Result<Vec<String>> {
        self.log_call(MockCall::RecommendTags {
            content: content.to_string(),
        });
        self.simulate_latency().await;

        match self.config.fail_tags {
            Some(status) => Err(Error::Remote {
                status,
                body: "simulated failure".to_string(),
            }),
            None => Ok(self.config.tags.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
