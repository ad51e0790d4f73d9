use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::api::{rows_to_records, RemoteStore, Sheet, SheetRow};
use crate::cache::CacheManager;
use crate::models::Record;

use super::writer::{SyncEvent, WriteQueue};

/// Where the records of the last load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub source: LoadSource,
    pub count: usize,
    /// Set when the remote sheet was configured but could not be read.
    pub advisory: Option<String>,
}

/// In-memory record list for one sheet, mirrored to the local cache and
/// replicated to the remote sheet.
///
/// Reads are two-tier: the remote sheet wins whenever it answers, the local
/// cache is only a fallback and is never merged with it. Writes are local
/// first: the list changes immediately, the cache is rewritten right after,
/// and the remote copy is updated in the background through a `WriteQueue`.
/// A failed remote write never rolls back the local change.
///
/// Sheet rows that do not map to a record are held alongside the list and
/// appended unchanged to every write.
pub struct SyncedStore<R> {
    records: Vec<R>,
    unmapped: Vec<Vec<String>>,
    cache: Arc<CacheManager>,
    remote: Option<Arc<dyn RemoteStore>>,
    writer: Option<WriteQueue>,
    local_events: Vec<SyncEvent>,
}

impl<R> SyncedStore<R>
where
    R: Record + SheetRow + Serialize + DeserializeOwned,
{
    /// Without a remote the store works from the local cache only.
    /// With one, a writer task is spawned, so this must run inside a Tokio runtime.
    pub fn new(cache: Arc<CacheManager>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let writer = remote
            .as_ref()
            .map(|remote| WriteQueue::spawn(R::SHEET, Arc::clone(remote)));

        Self {
            records: Vec::new(),
            unmapped: Vec::new(),
            cache,
            remote,
            writer,
            local_events: Vec::new(),
        }
    }

    pub fn sheet(&self) -> Sheet {
        R::SHEET
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Sheet rows that could not be mapped to a record.
    pub fn unmapped_rows(&self) -> &[Vec<String>] {
        &self.unmapped
    }

    /// Populate the store: remote sheet if reachable, else local cache, else empty.
    pub async fn load(&mut self) -> LoadOutcome {
        let sheet = R::SHEET;
        let mut advisory = None;

        if let Some(remote) = self.remote.clone() {
            match remote.fetch_rows(sheet).await {
                Ok(rows) => {
                    let mapped = rows_to_records(rows);
                    self.records = mapped.records;
                    self.unmapped = mapped.unmapped;
                    self.save_cache();
                    info!(sheet = sheet.name(), count = self.records.len(), "Loaded from remote sheet");
                    return LoadOutcome {
                        source: LoadSource::Remote,
                        count: self.records.len(),
                        advisory: None,
                    };
                }
                Err(e) => {
                    warn!(sheet = sheet.name(), error = %e, "Remote load failed, falling back to local cache");
                    advisory = Some(format!(
                        "Could not load {} from the remote sheet. Using local data.",
                        sheet
                    ));
                }
            }
        }

        let (records, source) = match self.cache.load::<R>(sheet.cache_key()) {
            Ok(Some(records)) => (records, LoadSource::Cache),
            Ok(None) => (Vec::new(), LoadSource::Empty),
            Err(e) => {
                warn!(sheet = sheet.name(), error = %e, "Local cache unreadable, starting empty");
                (Vec::new(), LoadSource::Empty)
            }
        };
        self.records = records;
        self.unmapped = self.cache.load_or_empty(sheet.unmapped_cache_key());
        debug!(sheet = sheet.name(), count = self.records.len(), ?source, "Loaded from local cache");

        LoadOutcome {
            source,
            count: self.records.len(),
            advisory,
        }
    }

    /// Apply `change` to the record list, then write the local cache and
    /// queue the new list for the remote sheet.
    pub fn mutate<T>(&mut self, change: impl FnOnce(&mut Vec<R>) -> T) -> T {
        let result = change(&mut self.records);
        self.commit();
        result
    }

    /// Remove the record with `id`. Returns false, and writes nothing, if
    /// there was no such record.
    pub fn remove_by_id(&mut self, id: i64) -> bool {
        let Some(position) = self.records.iter().position(|r| r.id() == id) else {
            debug!(sheet = R::SHEET.name(), id, "No record to delete");
            return false;
        };
        self.mutate(|records| {
            records.remove(position);
        });
        true
    }

    fn save_cache(&mut self) {
        let sheet = R::SHEET;
        let saved = self
            .cache
            .save(sheet.cache_key(), &self.records)
            .and_then(|()| self.cache.save(sheet.unmapped_cache_key(), &self.unmapped));
        if let Err(e) = saved {
            warn!(sheet = sheet.name(), error = %e, "Failed to write local cache");
            self.local_events.push(SyncEvent::CacheFailed {
                sheet,
                error: e.to_string(),
            });
        }
    }

    fn commit(&mut self) {
        self.save_cache();

        if let Some(writer) = &self.writer {
            let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let rows = self
                .records
                .iter()
                .map(|r| r.to_row(&timestamp))
                .chain(self.unmapped.iter().cloned())
                .collect();
            writer.enqueue(rows);
        }
    }

    /// Outcomes of cache and remote writes since the last call.
    pub fn poll_events(&mut self) -> Vec<SyncEvent> {
        let mut events = std::mem::take(&mut self.local_events);
        if let Some(writer) = &mut self.writer {
            events.extend(writer.drain_events());
        }
        events
    }

    /// Wait for queued remote writes to be attempted.
    pub async fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
