//! Record source contract and built-in implementations.
//!
//! Modules:
//! - `memory`: `BTreeMap`-backed source that tolerates concurrent mutation

mod memory;

use feed_types::{CatalogRecord, EntityId, FeedError, RecordShape};

pub use memory::MemoryRecordSource;

/// Filter, order, and limit for one record source query.
///
/// Results are always ordered by ascending entity id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQuery {
    /// Only match records whose id is strictly greater than this cursor.
    pub after_id: Option<EntityId>,
    /// Maximum number of records to return. `None` returns every match.
    pub limit: Option<usize>,
    /// Only match records assigned to this store.
    pub store_code: Option<String>,
    /// Only match records of this shape.
    pub shape: Option<RecordShape>,
}

impl SourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(mut self, cursor: Option<EntityId>) -> Self {
        self.after_id = cursor;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn store(mut self, store_code: Option<String>) -> Self {
        self.store_code = store_code;
        self
    }

    pub fn shape(mut self, shape: Option<RecordShape>) -> Self {
        self.shape = shape;
        self
    }

    /// Whether a record satisfies every filter of this query. The limit is not a filter.
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        self.after_id.is_none_or(|cursor| record.entity_id() > cursor)
            && self.shape.is_none_or(|shape| record.shape() == shape)
            && self.store_code.as_deref().is_none_or(|store_code| record.in_store(store_code))
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    /// Matching records in ascending id order, truncated to the query limit.
    pub records: Vec<CatalogRecord>,
    /// Number of records matching the query filters before the limit was applied,
    /// measured in the same call that produced `records`.
    pub remaining_size: usize,
}

/// A queryable collection of catalog records.
///
/// Implementations may be shared with writers outside the feed run. Each
/// query is evaluated against the data as it is at call time.
pub trait RecordSource: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &str;

    /// Execute a query.
    ///
    /// # Errors
    /// Returns [`FeedError::SourceUnavailable`] when the backend cannot execute the query.
    fn query(&self, query: &SourceQuery) -> Result<SourcePage, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::{CategoryRecord, ProductRecord};

    #[test]
    fn query_filters_compose() {
        let product = CatalogRecord::from(ProductRecord {
            entity_id: 5,
            store_codes: vec!["en".into()],
            ..Default::default()
        });
        let category = CatalogRecord::from(CategoryRecord {
            entity_id: 9,
            name: "Root".into(),
            ..Default::default()
        });

        assert!(SourceQuery::new().matches(&product));
        assert!(SourceQuery::new().after(Some(4)).matches(&product));
        assert!(!SourceQuery::new().after(Some(5)).matches(&product));
        assert!(!SourceQuery::new().store(Some("fr".into())).matches(&product));
        assert!(SourceQuery::new().store(Some("fr".into())).matches(&category));
        assert!(!SourceQuery::new().shape(Some(RecordShape::Product)).matches(&category));
    }
}
