use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use feed_types::{CatalogRecord, EntityId, FeedError};
use tracing::debug;

use super::{RecordSource, SourcePage, SourceQuery};

/// In-memory record source keyed by entity id.
///
/// Writers may insert or remove records between queries; every query sees the
/// state at the moment it runs.
#[derive(Debug, Default)]
pub struct MemoryRecordSource {
    name: String,
    records: RwLock<BTreeMap<EntityId, CatalogRecord>>,
}

impl MemoryRecordSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a source from records. Later records replace earlier ones with the same id.
    pub fn with_records(name: impl Into<String>, records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let source = Self::new(name);
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&self, record: CatalogRecord) -> Option<CatalogRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.entity_id(), record)
    }

    pub fn remove(&self, entity_id: EntityId) -> Option<CatalogRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.remove(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSource for MemoryRecordSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, query: &SourceQuery) -> Result<SourcePage, FeedError> {
        let records = self
            .records
            .read()
            .map_err(|error| FeedError::source_unavailable(&self.name, error.to_string()))?;

        let matching: Vec<&CatalogRecord> = match query.after_id {
            Some(cursor) => records.range(cursor.saturating_add(1)..).map(|(_, record)| record).collect(),
            None => records.values().collect(),
        };
        let matching: Vec<&CatalogRecord> = matching.into_iter().filter(|record| query.matches(record)).collect();

        let remaining_size = matching.len();
        let take = query.limit.unwrap_or(remaining_size);
        let page = SourcePage {
            records: matching.into_iter().take(take).cloned().collect(),
            remaining_size,
        };
        debug!(
            source = %self.name,
            after_id = ?query.after_id,
            limit = ?query.limit,
            returned = page.records.len(),
            remaining_size,
            "memory source query executed"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::ProductRecord;

    fn product(entity_id: EntityId) -> CatalogRecord {
        CatalogRecord::from(ProductRecord {
            entity_id,
            ..Default::default()
        })
    }

    fn ids(page: &SourcePage) -> Vec<EntityId> {
        page.records.iter().map(CatalogRecord::entity_id).collect()
    }

    #[test]
    fn returns_ascending_ids_with_remaining_size_before_limit() {
        let source = MemoryRecordSource::with_records("catalog", [product(30), product(10), product(20)]);

        let page = source.query(&SourceQuery::new().limit(Some(2))).expect("query");
        assert_eq!(ids(&page), vec![10, 20]);
        assert_eq!(page.remaining_size, 3);

        let page = source.query(&SourceQuery::new().after(Some(10)).limit(Some(2))).expect("query");
        assert_eq!(ids(&page), vec![20, 30]);
        assert_eq!(page.remaining_size, 2);
    }

    #[test]
    fn cursor_at_max_id_yields_empty_page() {
        let source = MemoryRecordSource::with_records("catalog", [product(1), product(u64::MAX)]);
        let page = source.query(&SourceQuery::new().after(Some(u64::MAX))).expect("query");
        assert!(page.records.is_empty());
        assert_eq!(page.remaining_size, 0);
    }

    #[test]
    fn sees_mutations_between_queries() {
        let source = MemoryRecordSource::with_records("catalog", [product(1), product(2)]);
        assert_eq!(source.len(), 2);

        source.remove(2);
        source.insert(product(3));
        let page = source.query(&SourceQuery::new().after(Some(1))).expect("query");
        assert_eq!(ids(&page), vec![3]);
    }
}
