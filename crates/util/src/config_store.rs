//! Scoped flat configuration store and the feed settings loader.
//!
//! Settings live under slash-separated paths (`section/group/field`) and may be
//! overridden per store scope. Lookups fall back from the store scope to the
//! `default` scope.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use feed_types::{
    CATEGORIES_IN_NAVIGATION_PATH, DEFAULT_STORE_CODE, EXPORT_PRODUCT_PRICES_PATH, FeedConfig, FeedError, GROUPED_PATH, IMAGE_SIZE_PATH,
    MINIMAL_PRICE_PATH,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config_values::{parse_decimal, try_parse_boolean};

/// Read access to a flat `path -> raw value` configuration backend.
pub trait ConfigStore {
    /// Raw value at `path` for `scope`, or `None` when unset.
    fn get_value(&self, path: &str, scope: &str) -> Option<String>;
}

/// In-memory scoped configuration store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatConfigStore {
    scopes: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    scopes: IndexMap<String, IndexMap<String, Value>>,
}

impl FlatConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value for a scope, replacing any previous one.
    pub fn set(&mut self, scope: impl Into<String>, path: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.scopes.entry(scope.into()).or_default().insert(path.into(), value.into());
        self
    }

    /// Builder-style variant of [`FlatConfigStore::set`].
    pub fn with(mut self, scope: impl Into<String>, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(scope, path, value);
        self
    }

    /// Parse a YAML (or JSON) document of the shape `{ scopes: { <scope>: { <path>: <value> } } }`.
    ///
    /// Scalar values are kept in their textual form; booleans become `1`/`0`
    /// and nulls are treated as unset.
    pub fn from_document_str(content: &str) -> Result<Self> {
        let document: ConfigDocument = serde_yaml::from_str(content).context("Failed to parse configuration document")?;

        let mut store = Self::new();
        for (scope, values) in document.scopes {
            for (path, value) in values {
                let raw = match value {
                    Value::Null => continue,
                    Value::String(text) => text,
                    Value::Bool(flag) => (if flag { "1" } else { "0" }).to_string(),
                    Value::Number(number) => number.to_string(),
                    other => anyhow::bail!("configuration value at '{}' in scope '{}' must be a scalar, got {}", path, scope, other),
                };
                store.set(scope.clone(), path, raw);
            }
        }
        Ok(store)
    }

    /// Load a configuration document from disk.
    pub fn from_path(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read configuration file: {}", file_path.display()))?;
        Self::from_document_str(&content).with_context(|| format!("Invalid configuration file: {}", file_path.display()))
    }
}

impl ConfigStore for FlatConfigStore {
    fn get_value(&self, path: &str, scope: &str) -> Option<String> {
        self.scopes
            .get(scope)
            .and_then(|values| values.get(path))
            .or_else(|| self.scopes.get(DEFAULT_STORE_CODE).and_then(|values| values.get(path)))
            .cloned()
    }
}

/// Read the feed settings for `store_code`.
///
/// Unset keys take the [`FeedConfig`] defaults. Unrecognized booleans fall back
/// to their default with a warning. A minimal price that is not a number is a
/// configuration error.
pub fn load_feed_config(store: &dyn ConfigStore, store_code: &str) -> Result<FeedConfig, FeedError> {
    let defaults = FeedConfig::default();

    let minimal_price = match store.get_value(MINIMAL_PRICE_PATH, store_code) {
        Some(raw) if raw.trim().is_empty() => defaults.minimal_price,
        Some(raw) => parse_decimal(&raw).ok_or_else(|| FeedError::config(MINIMAL_PRICE_PATH, format!("'{}' is not a number", raw)))?,
        None => defaults.minimal_price,
    };

    let image_size = store
        .get_value(IMAGE_SIZE_PATH, store_code)
        .map(|raw| raw.trim().to_string())
        .filter(|size| !size.is_empty());

    let config = FeedConfig {
        grouped: read_flag(store, GROUPED_PATH, store_code, defaults.grouped),
        image_size,
        export_product_prices: read_flag(store, EXPORT_PRODUCT_PRICES_PATH, store_code, defaults.export_product_prices),
        minimal_price,
        categories_in_navigation: read_flag(store, CATEGORIES_IN_NAVIGATION_PATH, store_code, defaults.categories_in_navigation),
        store_code: store_code.to_string(),
    };
    debug!(store_code = %store_code, ?config, "feed configuration loaded");
    Ok(config)
}

fn read_flag(store: &dyn ConfigStore, path: &str, scope: &str, default_value: bool) -> bool {
    let Some(raw) = store.get_value(path, scope) else {
        return default_value;
    };
    try_parse_boolean(&raw).unwrap_or_else(|| {
        warn!(path = %path, scope = %scope, value = %raw, "unrecognized boolean configuration value; using default");
        default_value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_scope_overrides_default_scope() {
        let store = FlatConfigStore::new()
            .with("default", IMAGE_SIZE_PATH, "small_image")
            .with("default", GROUPED_PATH, "1")
            .with("fr", IMAGE_SIZE_PATH, "thumbnail");

        assert_eq!(store.get_value(IMAGE_SIZE_PATH, "fr").as_deref(), Some("thumbnail"));
        assert_eq!(store.get_value(GROUPED_PATH, "fr").as_deref(), Some("1"));
        assert_eq!(store.get_value(IMAGE_SIZE_PATH, "de").as_deref(), Some("small_image"));
        assert_eq!(store.get_value(MINIMAL_PRICE_PATH, "de"), None);
    }

    #[test]
    fn loads_defaults_for_empty_store() {
        let config = load_feed_config(&FlatConfigStore::new(), "default").expect("defaults");
        assert_eq!(config, FeedConfig::default());
    }

    #[test]
    fn loads_typed_settings() {
        let store = FlatConfigStore::new()
            .with("default", GROUPED_PATH, "yes")
            .with("default", EXPORT_PRODUCT_PRICES_PATH, "0")
            .with("default", MINIMAL_PRICE_PATH, "1.5")
            .with("default", CATEGORIES_IN_NAVIGATION_PATH, "on")
            .with("en", IMAGE_SIZE_PATH, " small_image ");

        let config = load_feed_config(&store, "en").expect("config");
        assert!(config.grouped);
        assert!(!config.export_product_prices);
        assert_eq!(config.minimal_price, 1.5);
        assert!(config.categories_in_navigation);
        assert_eq!(config.image_size.as_deref(), Some("small_image"));
        assert_eq!(config.store_code, "en");
    }

    #[test]
    fn unrecognized_flag_keeps_default() {
        let store = FlatConfigStore::new().with("default", EXPORT_PRODUCT_PRICES_PATH, "perhaps");
        let config = load_feed_config(&store, "default").expect("config");
        assert!(config.export_product_prices);
    }

    #[test]
    fn non_numeric_minimal_price_is_a_config_error() {
        let store = FlatConfigStore::new().with("default", MINIMAL_PRICE_PATH, "cheap");
        let error = load_feed_config(&store, "default").expect_err("invalid minimal price");
        assert!(matches!(error, FeedError::Config { ref key, .. } if key == MINIMAL_PRICE_PATH));
    }

    #[test]
    fn parses_document_with_scalar_values() {
        let content = r#"
scopes:
  default:
    feed_export/feed_settings/grouped: true
    feed_export/feed_settings/minimal_price: 2
    feed_export/feed_settings/image_size: null
  fr:
    feed_export/feed_settings/image_size: "thumbnail"
"#;
        let store = FlatConfigStore::from_document_str(content).expect("parse document");
        assert_eq!(store.get_value(GROUPED_PATH, "default").as_deref(), Some("1"));
        assert_eq!(store.get_value(MINIMAL_PRICE_PATH, "fr").as_deref(), Some("2"));
        assert_eq!(store.get_value(IMAGE_SIZE_PATH, "default"), None);
        assert_eq!(store.get_value(IMAGE_SIZE_PATH, "fr").as_deref(), Some("thumbnail"));
    }

    #[test]
    fn rejects_nested_values() {
        let content = "scopes:\n  default:\n    feed_export/feed_settings/grouped: [1, 2]\n";
        assert!(FlatConfigStore::from_document_str(content).is_err());
    }

    #[test]
    fn loads_document_from_json_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("feed.json");
        fs::write(
            &config_path,
            r#"{"scopes": {"default": {"feed_export/feed_settings/export_product_prices": "off"}}}"#,
        )
        .unwrap();

        let store = FlatConfigStore::from_path(&config_path).expect("load config file");
        let config = load_feed_config(&store, "default").expect("config");
        assert!(!config.export_product_prices);
    }

    #[test]
    fn missing_file_reports_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("absent.yaml");
        let error = FlatConfigStore::from_path(&missing).expect_err("missing file");
        assert!(error.to_string().contains("absent.yaml"));
    }
}
