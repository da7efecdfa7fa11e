//! Remote store client speaking the object-storage and REST collection APIs.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ideacap_core::defaults::{
    IDEAS_TABLE, IMAGE_BUCKET, IMAGE_MIME_TYPE, REMOTE_TIMEOUT_SECS, UPSERT_PREFER,
};
use ideacap_core::{
    BatchReport, Error, HttpRequest, HttpResponse, Idea, RemoteIdeaRecord, RemoteStore,
    RemoteStoreConfig, ReqwestTransport, Result, Transport, UploadOutcome,
};

/// Synchronizes ideas with the remote store.
///
/// Every upload is an upsert keyed by the idea's own identifier, so the
/// remote id always equals the local id and repeated uploads converge.
pub struct RemoteSyncEngine {
    config: RemoteStoreConfig,
    transport: Arc<dyn Transport>,
}

impl RemoteSyncEngine {
    /// Create an engine over an existing transport.
    pub fn new(config: RemoteStoreConfig, transport: Arc<dyn Transport>) -> Self {
        if config.is_configured() {
            info!(
                subsystem = "sync",
                component = "remote_store",
                base_url = %config.base(),
                "Initializing remote sync engine"
            );
        } else {
            warn!(
                subsystem = "sync",
                component = "remote_store",
                "Remote store not configured, sync disabled"
            );
        }
        Self { config, transport }
    }

    /// Create an engine with its own HTTP transport.
    pub fn from_config(config: RemoteStoreConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(REMOTE_TIMEOUT_SECS)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RemoteStoreConfig {
        &self.config
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured)
        }
    }

    /// Attach the key as both `apikey` and bearer token.
    fn authed(&self, request: HttpRequest) -> HttpRequest {
        let key = &self.config.publishable_key;
        request
            .header("apikey", key.as_str())
            .header("Authorization", format!("Bearer {}", key))
    }

    fn image_object_path(idea_id: Uuid) -> String {
        format!("{}/{}.jpg", IMAGE_BUCKET, idea_id)
    }

    /// Public URL of an idea's image, derived without a round trip.
    pub fn public_image_url(&self, idea_id: Uuid) -> String {
        format!(
            "{}/storage/v1/object/public/{}",
            self.config.base(),
            Self::image_object_path(idea_id)
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base(), IDEAS_TABLE)
    }

    /// Upload (or overwrite) an idea's image and return its public URL.
    #[instrument(skip(self, image_data), fields(subsystem = "sync", component = "remote_store", op = "upload_image", idea_id = %idea_id, image_bytes = image_data.len()))]
    pub async fn upload_image(&self, image_data: &[u8], idea_id: Uuid) -> Result<String> {
        self.ensure_configured()?;

        let url = format!(
            "{}/storage/v1/object/{}",
            self.config.base(),
            Self::image_object_path(idea_id)
        );
        let request = self
            .authed(HttpRequest::put(url))
            .header("Content-Type", IMAGE_MIME_TYPE)
            .header("x-upsert", "true")
            .body(image_data.to_vec());

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(upload_failed(response));
        }

        let public_url = self.public_image_url(idea_id);
        debug!(url = %public_url, "Image uploaded");
        Ok(public_url)
    }

    async fn post_record(&self, record: &RemoteIdeaRecord) -> Result<()> {
        let request = self
            .authed(HttpRequest::post(self.collection_url()))
            .header("Prefer", UPSERT_PREFER)
            .json(record)?;

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(upload_failed(response));
        }
        Ok(())
    }
}

fn upload_failed(response: HttpResponse) -> Error {
    Error::UploadFailed {
        status: response.status,
        body: response.text(),
    }
}

#[async_trait]
impl RemoteStore for RemoteSyncEngine {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    #[instrument(skip(self, idea), fields(subsystem = "sync", component = "remote_store", op = "upload_idea", idea_id = %idea.id()))]
    async fn upload_idea_detailed(&self, idea: &Idea) -> Result<UploadOutcome> {
        self.ensure_configured()?;
        let start = Instant::now();

        // Fresh bytes win; otherwise keep pointing at the image uploaded earlier.
        let image_url = match idea.image_data() {
            Some(bytes) => Some(self.upload_image(bytes, idea.id()).await?),
            None => idea.image_url().map(str::to_string),
        };

        let record = idea.to_remote(image_url.clone());
        self.post_record(&record).await?;

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            has_image = image_url.is_some(),
            "Idea uploaded"
        );
        Ok(UploadOutcome {
            remote_id: idea.wire_id(),
            image_url,
        })
    }

    #[instrument(skip(self, ideas), fields(subsystem = "sync", component = "remote_store", op = "upload_ideas", batch_size = ideas.len()))]
    async fn upload_ideas_with_report(&self, ideas: &[Idea]) -> Result<BatchReport> {
        self.ensure_configured()?;

        let mut report = BatchReport::default();
        for idea in ideas {
            match self.upload_idea_detailed(idea).await {
                Ok(outcome) => report.succeeded.push((idea.id(), outcome)),
                Err(e) => {
                    warn!(idea_id = %idea.id(), error = %e, "Batch item upload failed");
                    report.failed.push((idea.id(), e.to_string()));
                }
            }
        }

        info!(
            success_count = report.success_count(),
            failure_count = report.failure_count(),
            "Batch upload complete"
        );
        Ok(report)
    }

    #[instrument(skip(self), fields(subsystem = "sync", component = "remote_store", op = "fetch_all_ideas"))]
    async fn fetch_all_ideas(&self) -> Result<Vec<RemoteIdeaRecord>> {
        self.ensure_configured()?;

        let url = format!("{}?select=*", self.collection_url());
        let response = self.transport.send(self.authed(HttpRequest::get(url))).await?;

        if response.status != 200 {
            return Err(Error::FetchFailed {
                status: response.status,
                body: response.text(),
            });
        }

        let records: Vec<RemoteIdeaRecord> = serde_json::from_slice(&response.body)
            .map_err(|e| Error::InvalidResponse(format!("Failed to parse ideas: {}", e)))?;
        debug!(count = records.len(), "Fetched remote ideas");
        Ok(records)
    }

    #[instrument(skip(self), fields(subsystem = "sync", component = "remote_store", op = "delete_idea"))]
    async fn delete_idea(&self, id: &str) -> Result<()> {
        self.ensure_configured()?;

        let url = format!("{}?id=eq.{}", self.collection_url(), id);
        let response = self
            .transport
            .send(self.authed(HttpRequest::delete(url)))
            .await?;

        if !response.is_success() {
            return Err(Error::DeleteFailed {
                status: response.status,
                body: response.text(),
            });
        }

        debug!("Remote idea deleted");
        Ok(())
    }
}
