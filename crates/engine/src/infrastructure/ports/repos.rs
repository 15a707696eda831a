//! Settings storage port.

use async_trait::async_trait;
use serde_json::Value;

use super::error::RepoError;

// =============================================================================
// Settings Storage
// =============================================================================

/// Key-value settings storage. Values are arbitrary JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError>;
}
