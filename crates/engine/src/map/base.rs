use feed_types::RecordShape;
use serde_json::Value;

use super::FeedMap;
use crate::item::Item;

/// Shape-agnostic map that resolves every field as a record property.
///
/// Also serves as the fallback for fields a specialized map does not register.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseMap;

impl FeedMap for BaseMap {
    fn required_shape(&self) -> Option<RecordShape> {
        None
    }

    fn resolve(&self, item: &Item, field: &str) -> Option<Value> {
        item.context().property(field)
    }
}
