//! # Store Manager
//!
//! The process-wide settings store, held explicitly and passed by handle to
//! the session layer and any front end. Owns the in-memory settings blob and
//! an injected persistence port; every mutation rewrites the whole document
//! through the port before returning.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::storage::SettingsStorage;
use crate::types::{Category, HistoryItem, Settings, Theme};

/// Settings and conversation-history store
pub struct StoreManager {
    storage: Arc<dyn SettingsStorage>,
    settings: RwLock<Settings>,
}

impl StoreManager {
    /// Rehydrate the store through the persistence port.
    ///
    /// A missing document yields defaults: empty buckets, default model,
    /// system theme.
    pub async fn load(storage: Arc<dyn SettingsStorage>) -> StoreResult<Arc<Self>> {
        let settings = storage.load().await?.unwrap_or_default();
        info!("store manager initialized");
        Ok(Arc::new(Self {
            storage,
            settings: RwLock::new(settings),
        }))
    }

    /// Snapshot of the whole settings blob
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn api_key(&self) -> String {
        self.settings.read().api_key.clone()
    }

    pub async fn set_api_key(&self, key: impl Into<String>) -> StoreResult<()> {
        self.settings.write().api_key = key.into();
        self.persist().await
    }

    pub fn selected_model(&self) -> String {
        self.settings.read().selected_model.clone()
    }

    pub async fn set_selected_model(&self, model: impl Into<String>) -> StoreResult<()> {
        self.settings.write().selected_model = model.into();
        self.persist().await
    }

    pub fn theme(&self) -> Theme {
        self.settings.read().theme
    }

    pub async fn set_theme(&self, theme: Theme) -> StoreResult<()> {
        self.settings.write().theme = theme;
        self.persist().await
    }

    /// Add (or replace) a conversation in the history.
    ///
    /// Any existing entry with the same id is removed first, and the item is
    /// filed under that entry's bucket rather than the one recomputed from
    /// its date. New ids get the computed bucket. Insertion is at the front,
    /// most-recent-first.
    pub async fn add_history(&self, item: HistoryItem) -> StoreResult<()> {
        {
            let mut settings = self.settings.write();

            let mut previous: Option<Category> = None;
            for (category, items) in settings.chat_history.iter_mut() {
                if let Some(pos) = items.iter().position(|i| i.id == item.id) {
                    items.remove(pos);
                    previous = Some(*category);
                }
            }

            let bucket =
                previous.unwrap_or_else(|| Category::for_date(item.date, Utc::now()));
            debug!(id = %item.id, %bucket, replaced = previous.is_some(), "history add");
            settings
                .chat_history
                .entry(bucket)
                .or_default()
                .insert(0, item);
        }
        self.persist().await
    }

    /// Remove a conversation from every bucket
    pub async fn remove_history(&self, id: &str) -> StoreResult<()> {
        {
            let mut settings = self.settings.write();
            for items in settings.chat_history.values_mut() {
                items.retain(|item| item.id != id);
            }
        }
        self.persist().await
    }

    /// Reset all buckets to empty
    pub async fn clear_history(&self) -> StoreResult<()> {
        {
            let mut settings = self.settings.write();
            settings.chat_history = Category::all()
                .into_iter()
                .map(|c| (c, Vec::new()))
                .collect();
        }
        info!("chat history cleared");
        self.persist().await
    }

    /// Ordered snapshot of the bucket mapping
    pub fn history_by_category(&self) -> BTreeMap<Category, Vec<HistoryItem>> {
        self.settings.read().chat_history.clone()
    }

    /// Find one conversation by id
    pub fn find_history(&self, id: &str) -> Option<HistoryItem> {
        self.settings
            .read()
            .chat_history
            .values()
            .flatten()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Total number of stored conversations
    pub fn history_len(&self) -> usize {
        self.settings
            .read()
            .chat_history
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Case-insensitive substring search over titles and summaries.
    ///
    /// Bucket structure is preserved; buckets with no matches are omitted
    /// from the result. Storage is untouched.
    pub fn search_history(&self, query: &str) -> BTreeMap<Category, Vec<HistoryItem>> {
        let query = query.to_lowercase();
        let settings = self.settings.read();

        settings
            .chat_history
            .iter()
            .filter_map(|(category, items)| {
                let matches: Vec<HistoryItem> = items
                    .iter()
                    .filter(|item| {
                        item.title.to_lowercase().contains(&query)
                            || item.summary.to_lowercase().contains(&query)
                    })
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    None
                } else {
                    Some((*category, matches))
                }
            })
            .collect()
    }

    /// Write the blob back through the port
    async fn persist(&self) -> StoreResult<()> {
        let snapshot = self.settings.read().clone();
        self.storage.save(&snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_storage::JsonFileStorage;
    use chrono::Duration;
    use nova_core::Message;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> Arc<StoreManager> {
        let storage = Arc::new(JsonFileStorage::new(dir.path().join("settings.json")));
        StoreManager::load(storage).await.unwrap()
    }

    fn item(id: &str, title: &str, date: chrono::DateTime<Utc>) -> HistoryItem {
        let messages = vec![Message::user(title), Message::assistant("reply")];
        HistoryItem {
            id: id.to_string(),
            title: title.to_string(),
            date,
            summary: "reply".to_string(),
            messages,
        }
    }

    #[tokio::test]
    async fn test_add_files_new_items_by_date() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store.add_history(item("a", "fresh", Utc::now())).await.unwrap();
        store
            .add_history(item("b", "stale", Utc::now() - Duration::days(30)))
            .await
            .unwrap();

        let history = store.history_by_category();
        assert_eq!(history[&Category::Today].len(), 1);
        assert_eq!(history[&Category::Earlier].len(), 1);
        assert_eq!(store.history_len(), 2);
    }

    #[tokio::test]
    async fn test_re_add_keeps_original_bucket() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store.add_history(item("a", "first", Utc::now())).await.unwrap();
        // Re-add with a date that would compute to a different bucket.
        store
            .add_history(item("a", "edited", Utc::now() - Duration::days(30)))
            .await
            .unwrap();

        assert_eq!(store.history_len(), 1);
        let history = store.history_by_category();
        assert_eq!(history[&Category::Today].len(), 1);
        assert_eq!(history[&Category::Today][0].title, "edited");
        assert!(history[&Category::Earlier].is_empty());
    }

    #[tokio::test]
    async fn test_add_inserts_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store.add_history(item("a", "older", Utc::now())).await.unwrap();
        store.add_history(item("b", "newer", Utc::now())).await.unwrap();

        let history = store.history_by_category();
        let today = &history[&Category::Today];
        assert_eq!(today[0].id, "b");
        assert_eq!(today[1].id, "a");
    }

    #[tokio::test]
    async fn test_remove_deletes_everywhere() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store.add_history(item("a", "chat", Utc::now())).await.unwrap();
        store.remove_history("a").await.unwrap();

        assert_eq!(store.history_len(), 0);
        assert!(store.find_history("a").is_none());
    }

    #[tokio::test]
    async fn test_clear_resets_buckets() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store.add_history(item("a", "chat", Utc::now())).await.unwrap();
        store.clear_history().await.unwrap();

        assert_eq!(store.history_len(), 0);
        assert_eq!(store.history_by_category().len(), 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_drops_empty_buckets() {
        let dir = TempDir::new().unwrap();
        let store = manager(&dir).await;

        store
            .add_history(item("a", "Rust borrow checker", Utc::now()))
            .await
            .unwrap();
        store
            .add_history(item("b", "dinner ideas", Utc::now() - Duration::days(30)))
            .await
            .unwrap();

        let results = store.search_history("BORROW");
        assert_eq!(results.len(), 1);
        assert_eq!(results[&Category::Today][0].id, "a");

        // Storage is untouched by searching.
        assert_eq!(store.history_len(), 2);
    }

    #[tokio::test]
    async fn test_mutations_survive_reload() {
        let dir = TempDir::new().unwrap();
        {
            let store = manager(&dir).await;
            store.set_api_key("sk-test").await.unwrap();
            store.add_history(item("a", "chat", Utc::now())).await.unwrap();
        }

        let reloaded = manager(&dir).await;
        assert_eq!(reloaded.api_key(), "sk-test");
        assert_eq!(reloaded.history_len(), 1);
        assert_eq!(reloaded.find_history("a").unwrap().title, "chat");
    }
}
