//! # Nova Settings Store
//!
//! Persisted settings and conversation history for the Nova chat client.
//!
//! The whole state is one document (API key, selected model, theme, and the
//! categorized chat history), rehydrated at startup and written back through
//! a [`SettingsStorage`] port on every mutation. [`StoreManager`] is the
//! explicit shared store object handed to the session layer and front ends.
//!
//! ## History semantics
//!
//! Conversations are filed under recency buckets (`today` / `this week` /
//! `earlier`). An id lives in at most one bucket: re-adding removes the old
//! entry first and keeps the item in its original bucket, so an updated
//! conversation does not jump buckets. Removal deletes the id everywhere.

pub mod error;
pub mod json_storage;
pub mod manager;
pub mod storage;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use json_storage::{default_settings_path, JsonFileStorage, SETTINGS_FILE};
pub use manager::StoreManager;
pub use storage::SettingsStorage;
pub use types::{Category, HistoryItem, Settings, Theme};
