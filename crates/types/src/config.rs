use serde::{Deserialize, Serialize};

/// Configuration path for grouped export.
pub const GROUPED_PATH: &str = "feed_export/feed_settings/grouped";
/// Configuration path for the exported image size.
pub const IMAGE_SIZE_PATH: &str = "feed_export/feed_settings/image_size";
/// Configuration path toggling price export.
pub const EXPORT_PRODUCT_PRICES_PATH: &str = "feed_export/feed_settings/export_product_prices";
/// Configuration path for the minimal exported price.
pub const MINIMAL_PRICE_PATH: &str = "feed_export/feed_settings/minimal_price";
/// Configuration path restricting categories to those shown in navigation.
pub const CATEGORIES_IN_NAVIGATION_PATH: &str = "feed_export/feed_settings/categories_in_navigation";

/// Store code used when no store scope is given.
pub const DEFAULT_STORE_CODE: &str = "default";

/// Feed settings for one store scope, read once per map construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Export grouped products as a single entry. Carried for the output layer.
    pub grouped: bool,
    /// Target image size, e.g. `small_image`. `None` exports the original image.
    pub image_size: Option<String>,
    pub export_product_prices: bool,
    /// Prices strictly below this threshold are not exported.
    pub minimal_price: f64,
    pub categories_in_navigation: bool,
    pub store_code: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            grouped: false,
            image_size: None,
            export_product_prices: true,
            minimal_price: 0.0,
            categories_in_navigation: false,
            store_code: DEFAULT_STORE_CODE.to_string(),
        }
    }
}
