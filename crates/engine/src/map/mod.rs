//! Field mapping: turns an item into named feed values.
//!
//! Modules:
//! - `registry`: field name -> resolver table
//! - `base`: generic property lookup used for unregistered fields
//! - `product`: product map with the built-in product resolvers

mod base;
mod product;
mod registry;

use feed_types::{FeedError, FeedRecord, RecordShape};
use serde_json::Value;

use crate::item::Item;

pub use base::BaseMap;
pub use product::{
    ATTRIBUTE_TEXT_FIELDS, AVAILABILITY_FIELD, CATEGORIES_FIELD, CURRENCY_FIELD, ID_FIELD, IMAGE_FIELD, PRICE_FIELD, ProductMap,
    QUANTITY_AND_STOCK_STATUS_FIELD, URL_FIELD,
};
pub use registry::{FieldResolver, ResolveContext, ResolverRegistry, resolver};

/// A mapping from items to feed field values.
pub trait FeedMap {
    /// Record shape this map accepts, `None` for any shape.
    fn required_shape(&self) -> Option<RecordShape>;

    /// Resolve one field for an item without memoization.
    ///
    /// Returns `None` for fields that cannot be resolved. Never fails.
    fn resolve(&self, item: &Item, field: &str) -> Option<Value>;

    /// Namespace for this map's memoized values on an item.
    fn cache_scope(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// An item bound to a map whose shape requirement it satisfies.
pub struct MappedItem<'a> {
    map: &'a dyn FeedMap,
    item: &'a Item,
}

impl<'a> MappedItem<'a> {
    /// Bind `item` to `map`.
    ///
    /// # Errors
    /// Returns [`FeedError::InvalidContext`] when the item's record is not the shape the map requires.
    pub fn bind(map: &'a dyn FeedMap, item: &'a Item) -> Result<Self, FeedError> {
        let found = item.context().shape();
        if let Some(expected) = map.required_shape()
            && expected != found
        {
            return Err(FeedError::invalid_context(expected, found));
        }
        Ok(Self { map, item })
    }

    pub fn item(&self) -> &Item {
        self.item
    }

    /// Memoized field value, `None` when unresolvable.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.item
            .memoized(self.map.cache_scope(), field, || self.map.resolve(self.item, field))
    }

    /// Resolve `fields` in order into an output row. Unresolved fields become `null`.
    pub fn record<S: AsRef<str>>(&self, fields: &[S]) -> FeedRecord {
        fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                (field.to_string(), self.get(field).unwrap_or(Value::Null))
            })
            .collect()
    }
}
