use chrono::{SubsecRound, Utc};

use crate::storage::{DocumentStore, StorageError};
use crate::types::{CachedStatus, IdeaStats, RemoteStatus, StatusSnapshot};

/// The `repoCache`/`lastChecked` slot of the idea document.
pub struct StatusCache<'a> {
    store: &'a DocumentStore,
}

impl<'a> StatusCache<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Replaces the cached snapshot with `status` and stamps `lastChecked`.
    /// Ideas stored alongside are left as they are.
    pub fn refresh(&self, status: RemoteStatus) -> Result<StatusSnapshot, StorageError> {
        let now = Utc::now().trunc_subsecs(3);
        let snapshot = StatusSnapshot {
            status,
            updated: now,
        };
        self.store.update(|doc| {
            doc.repo_cache = Some(snapshot.clone());
            doc.last_checked = Some(now);
            Ok::<_, StorageError>(())
        })?;
        Ok(snapshot)
    }

    /// The cached snapshot, without contacting GitHub.
    pub fn read(&self) -> CachedStatus {
        let doc = self.store.load();
        CachedStatus {
            repo_cache: doc.repo_cache,
            last_checked: doc.last_checked,
        }
    }

    pub fn stats(&self) -> IdeaStats {
        IdeaStats::from_document(&self.store.load())
    }
}
