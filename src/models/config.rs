//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

use crate::forms::validation::FieldMapping;
use crate::services::orders::{ControllerSettings, ViewScope};
use crate::{DEFAULT_ITEMS_PER_PAGE, SEARCH_DEBOUNCE, TOAST_COOLDOWN};

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Settings of one order list front-end.
pub struct AppConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_toast_cooldown_ms")]
    pub toast_cooldown_ms: u64,
    /// User the view acts as; queries wait until it is known.
    #[serde(default)]
    pub acting_user_id: Option<i32>,
    #[serde(default)]
    pub batch_id: Option<i32>,
    #[serde(default)]
    pub scope: ViewScope,
    /// Backend error keys translated to form field names.
    #[serde(default)]
    pub field_mapping: FieldMapping,
    /// JSON file with the orders served by the in-memory backend.
    #[serde(default)]
    pub seed_file: Option<String>,
    /// Artificial backend latency.
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_page_size() -> usize {
    DEFAULT_ITEMS_PER_PAGE
}

fn default_search_debounce_ms() -> u64 {
    SEARCH_DEBOUNCE.as_millis() as u64
}

fn default_toast_cooldown_ms() -> u64 {
    TOAST_COOLDOWN.as_millis() as u64
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            toast_cooldown_ms: default_toast_cooldown_ms(),
            acting_user_id: None,
            batch_id: None,
            scope: ViewScope::default(),
            field_mapping: FieldMapping::default(),
            seed_file: None,
            latency_ms: 0,
        }
    }
}

impl AppConfig {
    pub fn toast_cooldown(&self) -> Duration {
        Duration::from_millis(self.toast_cooldown_ms)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            page_size: self.page_size,
            search_debounce: Duration::from_millis(self.search_debounce_ms),
        }
    }
}

/// Loads the configuration for the profile named by `APP_ENV` (defaults to
/// `local`) from `./config`.
#[cfg(feature = "console")]
pub fn load_config() -> Result<AppConfig, config::ConfigError> {
    let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());
    load_config_from(std::path::Path::new("config"), &app_env)
}

/// Layers `default.yaml`, the optional `{app_env}.yaml` and `APP_*`
/// environment variables found under `dir`.
#[cfg(feature = "console")]
pub fn load_config_from(
    dir: &std::path::Path,
    app_env: &str,
) -> Result<AppConfig, config::ConfigError> {
    let default = dir.join("default");
    let profile = dir.join(app_env);

    config::Config::builder()
        .add_source(config::File::with_name(&default.to_string_lossy()))
        .add_source(config::File::with_name(&profile.to_string_lossy()).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_constants() {
        let config = AppConfig::default();
        let settings = config.controller_settings();

        assert_eq!(settings.page_size, DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(settings.search_debounce, SEARCH_DEBOUNCE);
        assert_eq!(config.toast_cooldown(), TOAST_COOLDOWN);
        assert!(config.latency().is_zero());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scope": "my_orders", "acting_user_id": 4}"#).unwrap();

        assert_eq!(config.scope, ViewScope::MyOrders);
        assert_eq!(config.acting_user_id, Some(4));
        assert_eq!(config.page_size, DEFAULT_ITEMS_PER_PAGE);
    }

    #[cfg(feature = "console")]
    #[test]
    fn profile_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.yaml"),
            "page_size: 25\nscope: orders\nlatency_ms: 10\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("test.yaml"),
            "scope: batch\nbatch_id: 3\n",
        )
        .unwrap();

        let config = load_config_from(dir.path(), "test").unwrap();

        assert_eq!(config.page_size, 25);
        assert_eq!(config.scope, ViewScope::Batch);
        assert_eq!(config.batch_id, Some(3));
        assert_eq!(config.latency_ms, 10);
    }

    #[cfg(feature = "console")]
    #[test]
    fn missing_default_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_from(dir.path(), "local").is_err());
    }
}
