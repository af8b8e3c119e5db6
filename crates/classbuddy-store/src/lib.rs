//! Lesson data model and local persistence for ClassBuddy.
//!
//! Holds the lesson-plan value types shared by every other crate, a small
//! key-value store abstraction with file and in-memory backends, and the
//! capped history ledger built on top of it.

pub mod config;
pub mod history;
pub mod kv;
pub mod models;

pub use config::StoreConfig;
pub use history::{HISTORY_CAPACITY, HISTORY_KEY, HistoryLedger};
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use models::{LessonPlan, LessonSection, SavedLesson};
