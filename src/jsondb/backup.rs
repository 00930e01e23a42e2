// Pre-mutation backups
//
// A snapshot of the document is written to the optional `backups` table at
// most once per interval per mutation label. Failures are logged and never
// abort the mutation.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::store::{RemoteStore, Row};
use super::tables::BACKUPS;
use crate::document::{new_id, Database};

/// Labels that are high-volume and low-value: no backup, no rules
pub fn is_analytics_label(label: &str) -> bool {
    label.starts_with("analytics")
}

/// Last backup time per label
struct BackupLedger {
    last_taken: HashMap<String, Instant>,
}

impl BackupLedger {
    fn new() -> Self {
        Self { last_taken: HashMap::new() }
    }

    fn is_due(&self, label: &str, interval: Duration) -> bool {
        match self.last_taken.get(label) {
            Some(taken) => taken.elapsed() >= interval,
            None => true,
        }
    }

    fn mark_taken(&mut self, label: &str) {
        self.last_taken.insert(label.to_string(), Instant::now());
    }
}

pub struct BackupThrottle {
    ledger: Mutex<BackupLedger>,
    /// `None` disables backups
    interval: Option<Duration>,
}

impl BackupThrottle {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            ledger: Mutex::new(BackupLedger::new()),
            interval,
        }
    }

    /// Claim the backup slot for a label; true when a backup should be written now
    pub async fn claim(&self, label: &str) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        if is_analytics_label(label) {
            return false;
        }
        let mut ledger = self.ledger.lock().await;
        if ledger.is_due(label, interval) {
            ledger.mark_taken(label);
            true
        } else {
            false
        }
    }

    /// Write a snapshot if the label's slot is free; returns whether one was written
    pub async fn maybe_backup(&self, store: &dyn RemoteStore, label: &str, db: &Database) -> bool {
        if !self.claim(label).await {
            return false;
        }

        let snapshot = match serde_json::to_value(db) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(label, error = %err, "backup snapshot could not be encoded");
                return false;
            }
        };

        let mut row = Row::new();
        row.insert("id".to_string(), Value::String(new_id("backup")));
        row.insert("label".to_string(), Value::String(label.to_string()));
        row.insert("snapshot".to_string(), snapshot);
        row.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));

        match store.insert_ignore_duplicates(BACKUPS.name, &[row], BACKUPS.conflict_key).await {
            Ok(()) => {
                tracing::debug!(label, "pre-mutation backup written");
                true
            }
            Err(err) => {
                tracing::warn!(label, error = %err, "pre-mutation backup skipped");
                false
            }
        }
    }
}
