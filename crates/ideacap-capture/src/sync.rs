//! Caller-initiated synchronization between the local store and the remote store.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ideacap_core::{
    Error, Idea, IdeaEdit, IdeaSort, IdeaStore, RemoteStore, Result,
};

/// Outcome of a sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of pulling remote records into the local store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub imported: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Remote records that could not be converted.
    pub skipped: usize,
}

/// Runs sync passes, edits and deletes against both stores.
pub struct SyncCoordinator {
    store: Arc<dyn IdeaStore>,
    remote: Arc<dyn RemoteStore>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn IdeaStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self { store, remote }
    }

    /// Upload every idea that needs it, or every idea when `force` is set.
    ///
    /// Each idea ends up synced or unsynced according to its own upload
    /// result; one failure never affects the others.
    #[instrument(skip(self), fields(subsystem = "capture", component = "sync_coordinator", op = "sync_all"))]
    pub async fn sync_all(&self, force: bool) -> Result<SyncSummary> {
        if !self.remote.is_configured() {
            return Err(Error::NotConfigured);
        }
        let start = Instant::now();

        let mut selected: Vec<Idea> = self
            .store
            .list(IdeaSort::CreatedAsc)
            .await?
            .into_iter()
            .filter(|idea| force || idea.needs_sync())
            .collect();

        if selected.is_empty() {
            debug!("Nothing to sync");
            return Ok(SyncSummary::default());
        }

        for idea in &mut selected {
            idea.begin_sync();
        }

        let report = self.remote.upload_ideas_with_report(&selected).await?;

        for idea in &selected {
            let recorded = match report.outcome_for(idea.id()) {
                Some(outcome) => {
                    record_synced(
                        self.store.as_ref(),
                        idea,
                        outcome.remote_id.clone(),
                        outcome.image_url.clone(),
                    )
                    .await
                }
                None => record_failed(self.store.as_ref(), idea).await,
            };
            if let Err(e) = recorded {
                warn!(idea_id = %idea.id(), error = %e, "Failed to record sync state");
            }
        }

        let summary = SyncSummary {
            attempted: selected.len(),
            succeeded: report.success_count(),
            failed: report.failure_count(),
        };
        info!(
            force,
            attempted = summary.attempted,
            success_count = summary.succeeded,
            failed = summary.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Sync pass complete"
        );
        Ok(summary)
    }

    /// Upload only ideas that are not yet synced.
    pub async fn sync_unsynced(&self) -> Result<SyncSummary> {
        self.sync_all(false).await
    }

    /// Apply a user edit and persist it. The idea becomes unsynced.
    #[instrument(skip(self, edit), fields(subsystem = "capture", component = "sync_coordinator", op = "edit", idea_id = %id))]
    pub async fn edit(&self, id: Uuid, edit: IdeaEdit) -> Result<Idea> {
        let mut idea = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("idea {}", id)))?;

        if idea.apply_edit(edit) {
            self.store.update(&idea).await?;
            info!("Idea edited");
        } else {
            debug!("Empty edit ignored");
        }
        Ok(idea)
    }

    /// Delete locally, then best-effort remotely.
    ///
    /// Returns whether the idea existed locally. Remote failures are logged.
    #[instrument(skip(self), fields(subsystem = "capture", component = "sync_coordinator", op = "delete", idea_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let existed = self.store.delete(id).await?;
        if !existed {
            return Ok(false);
        }
        info!("Idea deleted locally");

        if self.remote.is_configured() {
            if let Err(e) = self.remote.delete_idea(&id.to_string()).await {
                warn!(error = %e, "Remote delete failed");
            }
        }
        Ok(true)
    }

    /// Bring remote records into the local store.
    ///
    /// Missing ideas are imported. A local copy is replaced only when the
    /// remote one is strictly newer and the local one has no pending edits.
    #[instrument(skip(self), fields(subsystem = "capture", component = "sync_coordinator", op = "pull_remote"))]
    pub async fn pull_remote(&self) -> Result<PullSummary> {
        let records = self.remote.fetch_all_ideas().await?;
        let mut summary = PullSummary::default();

        for record in &records {
            let remote = match Idea::from_remote(record) {
                Ok(idea) => idea,
                Err(e) => {
                    warn!(remote_id = %record.id, error = %e, "Skipping invalid remote record");
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.store.fetch(remote.id()).await? {
                None => {
                    self.store.insert(&remote).await?;
                    summary.imported += 1;
                }
                Some(local) if !local.needs_sync() && remote.updated_at() > local.updated_at() => {
                    self.store.update(&remote).await?;
                    summary.updated += 1;
                }
                Some(_) => summary.unchanged += 1,
            }
        }

        info!(
            imported = summary.imported,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "Pull complete"
        );
        Ok(summary)
    }
}

/// Mark the stored copy synced unless it changed while uploading.
pub(crate) async fn record_synced(
    store: &dyn IdeaStore,
    uploaded: &Idea,
    remote_id: String,
    image_url: Option<String>,
) -> Result<()> {
    let mut synced = uploaded.clone();
    synced.mark_synced(remote_id, image_url);
    if !store.update_if_unchanged(&synced, uploaded.updated_at()).await? {
        debug!(idea_id = %uploaded.id(), "Idea edited or deleted during sync, leaving as is");
    }
    Ok(())
}

/// Return the stored copy to unsynced after a failed upload.
async fn record_failed(store: &dyn IdeaStore, uploaded: &Idea) -> Result<()> {
    let mut failed = uploaded.clone();
    failed.mark_sync_failed();
    store
        .update_if_unchanged(&failed, uploaded.updated_at())
        .await
        .map(|_| ())
}
