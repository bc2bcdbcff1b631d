//! Utility helpers shared by the feed crates: configuration coercion, the
//! scoped configuration store, and feed value formatting.

pub mod config_store;
pub mod config_values;
pub mod feed_format;

pub use config_store::{ConfigStore, FlatConfigStore, load_feed_config};
pub use config_values::{is_numeric, parse_decimal, try_parse_boolean};
pub use feed_format::{CATEGORY_SEPARATOR, CATEGORY_TREE_SEPARATOR, flatten_category_tree, format_price};
