//! History ledger: the most recent saved lesson plans, newest first.
//!
//! The whole list lives under a single key ([`HISTORY_KEY`]) as a JSON array
//! and is rewritten on every change. The list never grows past
//! [`HISTORY_CAPACITY`]; saving into a full ledger evicts the oldest entry.

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::kv::{KeyValueStore, StoreError};
use crate::models::{LessonPlan, SavedLesson};

/// Storage key holding the serialized history.
pub const HISTORY_KEY: &str = "lesson-planner-history";

/// Maximum number of retained entries.
pub const HISTORY_CAPACITY: usize = 20;

/// In-memory view of the persisted history, written through on every change.
pub struct HistoryLedger {
    store: Box<dyn KeyValueStore>,
    entries: Vec<SavedLesson>,
}

impl std::fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl HistoryLedger {
    /// Load the ledger from `store`.
    ///
    /// A missing key yields an empty ledger. An unreadable or corrupted value
    /// also yields an empty ledger (logged); it is overwritten on the next
    /// save.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let entries = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<SavedLesson>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(HISTORY_CAPACITY);
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "stored history is corrupted, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read stored history, starting empty");
                Vec::new()
            }
        };
        Self { store, entries }
    }

    /// Save a copy of `plan` as the newest entry and persist.
    pub fn save(&mut self, plan: &LessonPlan) -> Result<SavedLesson, StoreError> {
        let saved = SavedLesson {
            id: Uuid::new_v4().to_string(),
            lesson_plan: plan.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut entries = Vec::with_capacity(HISTORY_CAPACITY);
        entries.push(saved.clone());
        entries.extend(self.entries.iter().cloned());
        let evicted = entries.len().saturating_sub(HISTORY_CAPACITY);
        entries.truncate(HISTORY_CAPACITY);
        self.persist(&entries)?;
        self.entries = entries;

        info!(
            id = %saved.id,
            subject = %saved.lesson_plan.subject,
            evicted,
            "saved lesson to history"
        );
        Ok(saved)
    }

    /// Delete the entry with `id` and persist. Unknown ids are ignored.
    ///
    /// Returns whether an entry was removed. The in-memory list only changes
    /// once the write has succeeded.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let entries: Vec<SavedLesson> = self
            .entries
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect();
        let removed = entries.len() != self.entries.len();
        self.persist(&entries)?;
        self.entries = entries;
        Ok(removed)
    }

    /// Drop every entry and remove the persisted key.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)?;
        self.entries.clear();
        info!("cleared lesson history");
        Ok(())
    }

    /// Entries, most recent first.
    pub fn list(&self) -> &[SavedLesson] {
        &self.entries
    }

    /// Look up one entry by id.
    pub fn get(&self, id: &str) -> Option<&SavedLesson> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self, entries: &[SavedLesson]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &encoded)
    }
}
