//! Publish history.
//!
//! The last `HISTORY_LIMIT` publishes, persisted under the `history`
//! settings key as a JSON array, oldest first. Appends are serialised by the
//! store's lock; the in-memory copy is authoritative once loaded.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use rollreq_domain::{HistoryEntry, HistoryEntryId};

use crate::infrastructure::ports::{RepoError, SettingsStore};

pub const HISTORY_KEY: &str = "history";
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct HistoryStore {
    store: Arc<dyn SettingsStore>,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl HistoryStore {
    /// Load persisted history. An unreadable value starts an empty history.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self, HistoryError> {
        let entries = match store.get(HISTORY_KEY).await? {
            Some(value) => match serde_json::from_value::<Vec<HistoryEntry>>(value) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored history is unreadable, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut entries: VecDeque<HistoryEntry> = entries.into();
        while entries.len() > HISTORY_LIMIT {
            entries.pop_front();
        }
        tracing::debug!(entries = entries.len(), "History loaded");

        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Append and persist an entry, evicting the oldest beyond the limit.
    pub async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.stage(entry).await?.commit();
        Ok(())
    }

    /// Append and persist an entry but keep the previous state so the append
    /// can be undone. The history stays locked until the staged append is
    /// committed or rolled back.
    pub async fn stage(&self, entry: HistoryEntry) -> Result<StagedAppend<'_>, HistoryError> {
        let mut entries = self.entries.lock().await;
        let previous = entries.clone();

        entries.push_back(entry);
        while entries.len() > HISTORY_LIMIT {
            entries.pop_front();
        }

        if let Err(e) = self.persist(&entries).await {
            *entries = previous;
            return Err(e);
        }

        Ok(StagedAppend {
            store: self,
            entries,
            previous: Some(previous),
        })
    }

    /// Entries newest first.
    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.iter().rev().cloned().collect()
    }

    pub async fn get(&self, id: HistoryEntryId) -> Option<HistoryEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    async fn persist(&self, entries: &VecDeque<HistoryEntry>) -> Result<(), HistoryError> {
        let value = serde_json::to_value(entries).map_err(RepoError::serialization)?;
        self.store.set(HISTORY_KEY, value).await?;
        Ok(())
    }
}

/// An append that has been persisted but not yet confirmed.
///
/// Dropping it without `commit` restores the in-memory history only.
#[must_use = "a staged append must be committed or rolled back"]
pub struct StagedAppend<'a> {
    store: &'a HistoryStore,
    entries: MutexGuard<'a, VecDeque<HistoryEntry>>,
    previous: Option<VecDeque<HistoryEntry>>,
}

impl StagedAppend<'_> {
    pub fn commit(mut self) {
        self.previous = None;
    }

    /// Restore and re-persist the history as it was before the append.
    pub async fn rollback(mut self) -> Result<(), HistoryError> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        *self.entries = previous;
        self.store.persist(&self.entries).await
    }
}

impl Drop for StagedAppend<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::warn!("Staged history append dropped, restoring previous entries in memory");
            *self.entries = previous;
        }
    }
}
