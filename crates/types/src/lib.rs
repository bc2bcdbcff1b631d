//! Shared type definitions for catalog feed extraction.

mod config;
mod error;
mod record;

use indexmap::IndexMap;
use serde_json::Value;

pub use config::{
    CATEGORIES_IN_NAVIGATION_PATH, DEFAULT_STORE_CODE, EXPORT_PRODUCT_PRICES_PATH, FeedConfig, GROUPED_PATH, IMAGE_SIZE_PATH,
    MINIMAL_PRICE_PATH,
};
pub use error::FeedError;
pub use record::{CatalogRecord, CategoryRecord, EntityId, ProductRecord, RecordShape, StockInfo};

/// One output row: resolved field values in configured field order.
///
/// Fields that could not be resolved hold `Value::Null`.
pub type FeedRecord = IndexMap<String, Value>;
