//! Domain helper contract: translates product records into feed-ready primitives.
//!
//! Modules:
//! - `catalog`: helper backed by an in-memory category directory and store settings

mod catalog;

use anyhow::Result;
use feed_types::{CategoryRecord, ProductRecord};
use serde_json::Value;

pub use catalog::{CatalogProductHelper, StoreContext};

/// Stock availability vocabulary exported in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    InStock,
    OutOfStock,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::OutOfStock => "out_of_stock",
        }
    }
}

/// Lookups a product map delegates to.
///
/// Every method may fail or come back empty for missing data. The map turns
/// failures into `null` for the affected field; nothing here is retried.
pub trait ProductHelper: Send + Sync {
    /// Stable identifier, unique per product.
    fn product_id(&self, product: &ProductRecord) -> Result<Value>;

    /// Canonical product URL.
    fn product_url(&self, product: &ProductRecord) -> Result<Option<String>>;

    /// Category paths reachable from the product, each ordered root to leaf.
    fn product_categories_with_parents(&self, product: &ProductRecord, navigation_only: bool) -> Result<Vec<Vec<CategoryRecord>>>;

    /// Image URL at the requested size, `None` when the product has no image.
    fn product_image_url(&self, product: &ProductRecord, size: Option<&str>) -> Result<Option<String>>;

    fn product_price(&self, product: &ProductRecord) -> Result<f64>;

    fn product_availability(&self, product: &ProductRecord) -> Result<Availability>;

    /// Active currency code for the helper's store scope.
    fn currency_code(&self) -> Result<String>;

    /// Quantity and stock flag rendered as one value.
    fn quantity_and_stock_status(&self, product: &ProductRecord) -> Result<Option<String>>;

    /// Human-readable label of the option selected for `attribute`.
    fn attribute_text(&self, product: &ProductRecord, attribute: &str) -> Result<Option<String>>;
}
