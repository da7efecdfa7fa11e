//! Local idea stores.
//!
//! [`MemoryIdeaStore`] keeps ideas in a map and is what tests and embedders
//! use. [`JsonFileIdeaStore`] keeps one pretty-printed JSON document per idea
//! and backs the CLI. Both write [`SyncState::Syncing`] as `Unsynced`, so an
//! interrupted upload is picked up again by the next sync pass.
//!
//! [`SyncState::Syncing`]: ideacap_core::SyncState::Syncing

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use ideacap_core::{Error, Idea, IdeaSort, IdeaStore, Result};

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryIdeaStore {
    ideas: RwLock<HashMap<Uuid, Idea>>,
}

impl MemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdeaStore for MemoryIdeaStore {
    async fn insert(&self, idea: &Idea) -> Result<()> {
        let mut ideas = self.ideas.write().await;
        if ideas.contains_key(&idea.id()) {
            return Err(Error::InvalidInput(format!("idea {} already exists", idea.id())));
        }
        ideas.insert(idea.id(), idea.for_storage());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Idea>> {
        Ok(self.ideas.read().await.get(&id).cloned())
    }

    async fn update(&self, idea: &Idea) -> Result<()> {
        let mut ideas = self.ideas.write().await;
        match ideas.get_mut(&idea.id()) {
            Some(slot) => {
                *slot = idea.for_storage();
                Ok(())
            }
            None => Err(Error::NotFound(format!("idea {}", idea.id()))),
        }
    }

    async fn update_if_unchanged(
        &self,
        idea: &Idea,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut ideas = self.ideas.write().await;
        match ideas.get_mut(&idea.id()) {
            Some(slot) if slot.updated_at() == expected_updated_at => {
                *slot = idea.for_storage();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.ideas.write().await.remove(&id).is_some())
    }

    async fn list(&self, sort: IdeaSort) -> Result<Vec<Idea>> {
        let mut ideas: Vec<Idea> = self.ideas.read().await.values().cloned().collect();
        sort.apply(&mut ideas);
        Ok(ideas)
    }
}

/// Directory of `{id}.json` files.
#[derive(Debug)]
pub struct JsonFileIdeaStore {
    dir: PathBuf,
    // Serializes writers so check-then-write stays consistent within a process.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileIdeaStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(subsystem = "store", path = %dir.display(), "Opened idea store");
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write_atomic(&self, idea: &Idea) -> Result<()> {
        let path = self.path_for(idea.id());
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&idea.for_storage())?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read(path: &Path) -> Result<Idea> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl IdeaStore for JsonFileIdeaStore {
    async fn insert(&self, idea: &Idea) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(self.path_for(idea.id())).await? {
            return Err(Error::InvalidInput(format!("idea {} already exists", idea.id())));
        }
        self.write_atomic(idea).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Idea>> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read(&path).await.map(Some)
    }

    async fn update(&self, idea: &Idea) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !tokio::fs::try_exists(self.path_for(idea.id())).await? {
            return Err(Error::NotFound(format!("idea {}", idea.id())));
        }
        self.write_atomic(idea).await
    }

    async fn update_if_unchanged(
        &self,
        idea: &Idea,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(idea.id());
        if !tokio::fs::try_exists(&path).await? {
            return Ok(false);
        }
        if Self::read(&path).await?.updated_at() != expected_updated_at {
            return Ok(false);
        }
        self.write_atomic(idea).await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, sort: IdeaSort) -> Result<Vec<Idea>> {
        let mut ideas = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(idea) => ideas.push(idea),
                Err(e) => {
                    warn!(subsystem = "store", path = %path.display(), error = %e, "Skipping unreadable idea file");
                }
            }
        }

        sort.apply(&mut ideas);
        Ok(ideas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideacap_core::SyncState;

    fn idea(content: &str) -> Idea {
        Idea::new(None, content, vec!["t".into()], Some(vec![1, 2, 3]))
    }

    async fn exercise_store(store: &dyn IdeaStore) {
        let mut a = idea("first");
        store.insert(&a).await.unwrap();
        assert!(matches!(store.insert(&a).await, Err(Error::InvalidInput(_))));

        let fetched = store.fetch(a.id()).await.unwrap().unwrap();
        assert_eq!(fetched, a);

        a.set_content("first, edited");
        store.update(&a).await.unwrap();
        assert_eq!(
            store.fetch(a.id()).await.unwrap().unwrap().content(),
            "first, edited"
        );

        let stale = a.updated_at();
        let mut edited = a.clone();
        edited.set_content("edited elsewhere");
        store.update(&edited).await.unwrap();
        a.set_content("lost write");
        assert!(!store.update_if_unchanged(&a, stale).await.unwrap());
        assert_eq!(
            store.fetch(a.id()).await.unwrap().unwrap().content(),
            "edited elsewhere"
        );
        a = edited.clone();
        a.set_content("first, edited again");
        assert!(store.update_if_unchanged(&a, edited.updated_at()).await.unwrap());
        assert_eq!(
            store.fetch(a.id()).await.unwrap().unwrap().content(),
            "first, edited again"
        );

        let ghost = idea("ghost");
        assert!(!store
            .update_if_unchanged(&ghost, ghost.updated_at())
            .await
            .unwrap());
        assert!(matches!(store.update(&ghost).await, Err(Error::NotFound(_))));
        assert!(store.fetch(ghost.id()).await.unwrap().is_none());

        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = idea("second");
        store.insert(&b).await.unwrap();
        let listed = store.list(IdeaSort::CreatedDesc).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), b.id());

        assert!(store.delete(a.id()).await.unwrap());
        assert!(!store.delete(a.id()).await.unwrap());
        assert_eq!(store.list(IdeaSort::CreatedAsc).await.unwrap().len(), 1);
    }

    async fn syncing_is_persisted_as_unsynced(store: &dyn IdeaStore) {
        let mut a = idea("in flight");
        a.begin_sync();
        store.insert(&a).await.unwrap();
        let stored = store.fetch(a.id()).await.unwrap().unwrap();
        assert_eq!(stored.sync_state(), SyncState::Unsynced);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryIdeaStore::new();
        exercise_store(&store).await;
        syncing_is_persisted_as_unsynced(&store).await;
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIdeaStore::open(dir.path().join("ideas")).await.unwrap();
        exercise_store(&store).await;
        syncing_is_persisted_as_unsynced(&store).await;
    }

    #[tokio::test]
    async fn test_json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = idea("persisted");
        a.mark_synced(a.wire_id(), None);
        {
            let store = JsonFileIdeaStore::open(dir.path()).await.unwrap();
            store.insert(&a).await.unwrap();
        }

        let store = JsonFileIdeaStore::open(dir.path()).await.unwrap();
        let loaded = store.fetch(a.id()).await.unwrap().unwrap();
        assert_eq!(loaded, a);
        assert_eq!(loaded.image_data(), Some(&[1u8, 2, 3][..]));
        assert_eq!(loaded.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn test_json_file_store_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIdeaStore::open(dir.path()).await.unwrap();
        store.insert(&idea("good")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        assert_eq!(store.list(IdeaSort::default()).await.unwrap().len(), 1);
    }
}
