//! Settings use cases.
//!
//! Client preferences the core only reads (`gmDialog.autoClose`,
//! `showResultsDialog`) and the world style the GM edits.

use std::sync::Arc;

use serde_json::Value;

use rollreq_shared::StyleSettings;

use crate::infrastructure::ports::{RepoError, SettingsStore};

pub const AUTO_CLOSE_KEY: &str = "gmDialog.autoClose";
pub const SHOW_RESULTS_KEY: &str = "showResultsDialog";

/// Settings operations use case.
pub struct SettingsOps {
    store: Arc<dyn SettingsStore>,
}

impl SettingsOps {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Close the composer after a publish. Defaults to false.
    pub async fn close_composer_after_publish(&self) -> bool {
        self.read_bool(AUTO_CLOSE_KEY, false).await
    }

    /// Open the results view after a broadcast. Defaults to true.
    pub async fn open_results_after_publish(&self) -> bool {
        self.read_bool(SHOW_RESULTS_KEY, true).await
    }

    async fn read_bool(&self, key: &str, default: bool) -> bool {
        match self.store.get(key).await {
            Ok(Some(Value::Bool(value))) => value,
            Ok(Some(other)) => {
                tracing::warn!(key, value = %other, "Setting is not a boolean, using default");
                default
            }
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read setting, using default");
                default
            }
        }
    }

    /// Current world style. Missing keys are empty.
    pub async fn get_style(&self) -> Result<StyleSettings, SettingsError> {
        let mut style = StyleSettings::default();
        let fields = [
            (StyleSettings::OUTER_CONTAINER_KEY, &mut style.outer_container),
            (StyleSettings::GROUP_CONTAINER_KEY, &mut style.group_container),
            (StyleSettings::GROUP_HEADER_KEY, &mut style.group_header),
            (StyleSettings::ROLL_CONTAINER_KEY, &mut style.roll_container),
        ];
        for (key, field) in fields {
            if let Some(Value::String(css)) = self.store.get(key).await? {
                *field = css;
            }
        }
        Ok(style)
    }

    pub async fn update_style(&self, style: &StyleSettings) -> Result<(), SettingsError> {
        for (key, css) in style.entries() {
            self.store.set(key, Value::String(css.to_string())).await?;
        }
        Ok(())
    }
}

/// Errors that can occur during settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
