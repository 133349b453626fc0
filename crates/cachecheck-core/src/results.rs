use crate::record::LogRecord;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The authoritative, ordered collection of log records for the current
/// extraction batch.
///
/// Cloning a `ResultSet` yields another handle to the same collection. All
/// access goes through a readers-writer lock, so completed checks can be
/// reconciled from the queue worker while the front-end reads the table.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a new batch.
    ///
    /// Records sharing an `identity_id` with an earlier record are dropped, so
    /// the id stays a primary key. Returns the number of records kept.
    pub fn replace(&self, records: Vec<LogRecord>) -> usize {
        let mut seen = HashSet::new();
        let batch: Vec<LogRecord> = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.identity_id.clone());
                if !fresh {
                    tracing::debug!("Dropping duplicate log record for {}", record.identity_id);
                }
                fresh
            })
            .collect();

        let len = batch.len();
        *self.write() = batch;
        len
    }

    /// Merge a checked record back into the collection.
    ///
    /// Only `challenge_result` of the record with the same `identity_id` is
    /// overwritten. If the id is no longer present (the batch was refreshed
    /// while the check ran) nothing happens. Returns the updated record.
    pub fn apply(&self, updated: &LogRecord) -> Option<LogRecord> {
        let mut records = self.write();
        let Some(record) = records
            .iter_mut()
            .find(|record| record.identity_id == updated.identity_id)
        else {
            tracing::debug!(
                "Discarding check result for {}: no longer in result set",
                updated.identity_id
            );
            return None;
        };

        record.challenge_result = updated.challenge_result;
        Some(record.clone())
    }

    /// Snapshot of the current collection in order
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.read().clone()
    }

    pub fn get(&self, identity_id: &str) -> Option<LogRecord> {
        self.read()
            .iter()
            .find(|record| record.identity_id == identity_id)
            .cloned()
    }

    /// Record at a table position (0-based)
    pub fn get_index(&self, index: usize) -> Option<LogRecord> {
        self.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // A poisoned lock only means a reader panicked mid-clone; the data is intact.
    fn read(&self) -> RwLockReadGuard<'_, Vec<LogRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LogRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}
