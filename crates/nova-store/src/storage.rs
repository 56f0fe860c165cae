//! Persistence port for the settings blob.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::Settings;

/// Read-all/write-all persistence for the settings document.
///
/// The manager rehydrates through `load` once at startup and pushes the
/// whole blob back through `save` on every mutation.
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Load the persisted settings, or `None` when nothing was stored yet
    async fn load(&self) -> StoreResult<Option<Settings>>;

    /// Replace the persisted settings
    async fn save(&self, settings: &Settings) -> StoreResult<()>;
}
