//! Client for an OpenAI-compatible chat completion endpoint.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info, instrument, warn};

use ideacap_core::defaults::IMAGE_MIME_TYPE;
use ideacap_core::{
    CompletionBackend, CompletionConfig, Error, HttpRequest, ReqwestTransport, Result, Transport,
};

use crate::prompts::{tag_prompt, TRANSCRIBE_INSTRUCTION};
use crate::tags::extract_tags;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart};

/// Completion client used for handwriting OCR and tag suggestions.
pub struct CompletionClient {
    config: CompletionConfig,
    transport: Arc<dyn Transport>,
}

impl CompletionClient {
    /// Create a client over an existing transport.
    pub fn new(config: CompletionConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            subsystem = "inference",
            component = "completion",
            endpoint = %config.endpoint(),
            model = %config.model,
            "Initializing completion client"
        );
        Self { config, transport }
    }

    /// Create a client with its own HTTP transport honoring the configured timeout.
    pub fn from_config(config: CompletionConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout_secs)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Get the current configuration.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> Result<HttpRequest> {
        let payload = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
        };

        HttpRequest::post(self.config.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .json(&payload)
    }

    /// Send one request and return the first choice's raw content.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let start = Instant::now();
        let request = self.build_request(messages)?;
        debug!(body_len = request.body.len(), "Sending completion request");

        let response = self.transport.send(request).await?;

        if response.status != 200 {
            let body = response.text();
            warn!(status = response.status, error = %body, "Completion endpoint rejected request");
            return Err(Error::Remote {
                status: response.status,
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&response.body)
            .map_err(|e| Error::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        let content = parsed
            .first_content()
            .map(str::to_string)
            .ok_or(Error::EmptyResponse)?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            response_len = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}

/// Encode JPEG bytes as a `data:` URI.
pub fn image_data_uri(image_data: &[u8]) -> String {
    format!("data:{};base64,{}", IMAGE_MIME_TYPE, BASE64.encode(image_data))
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    #[instrument(skip(self, image_data), fields(subsystem = "inference", component = "completion", op = "recognize_text", model = %self.config.model, image_bytes = image_data.len()))]
    async fn recognize_text(&self, image_data: &[u8]) -> Result<String> {
        let message = ChatMessage::user(vec![
            ContentPart::text(TRANSCRIBE_INSTRUCTION),
            ContentPart::image_url(image_data_uri(image_data)),
        ]);

        let text = self.complete(vec![message]).await?.trim().to_string();
        info!(text_len = text.len(), "Text recognized");
        Ok(text)
    }

    #[instrument(skip(self, content), fields(subsystem = "inference", component = "completion", op = "recommend_tags", model = %self.config.model, content_len = content.len()))]
    async fn recommend_tags(&self, content: &str) -> Result<Vec<String>> {
        let message = ChatMessage::user(vec![ContentPart::text(tag_prompt(content))]);

        let raw = self.complete(vec![message]).await?;
        let tags = extract_tags(&raw);
        if tags.is_empty() {
            debug!(raw_len = raw.len(), "No tags could be extracted");
        }
        info!(tag_count = tags.len(), "Tags recommended");
        Ok(tags)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
