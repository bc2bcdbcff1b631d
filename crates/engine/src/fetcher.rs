//! Cursor-paginated batch fetcher.
//!
//! Batches are requested with an `id > cursor` filter instead of a row offset,
//! so records inserted or deleted between batches never cause skips or
//! duplicates among the records that survive. The cursor is the id of the last
//! record returned.

use std::sync::Arc;

use feed_types::{EntityId, FeedError, RecordShape};
use tracing::{debug, info};

use crate::{
    item::Item,
    source::{RecordSource, SourceQuery},
};

/// Outcome of the most recent `fetch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LastBatch {
    /// Offset in effect when the batch was requested.
    offset_at_start: u64,
    returned: usize,
    remaining_size: usize,
}

/// Walks a record source in bounded batches for one generation run.
///
/// A fetcher is owned by exactly one run. Concurrent runs must each build their own.
pub struct Fetcher {
    source: Arc<dyn RecordSource>,
    limit: Option<usize>,
    offset: u64,
    cursor: Option<EntityId>,
    store_code: Option<String>,
    shape: Option<RecordShape>,
    last_batch: Option<LastBatch>,
    last_processed_entity_id: Option<EntityId>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            limit: None,
            offset: 0,
            cursor: None,
            store_code: None,
            shape: None,
            last_batch: None,
            last_processed_entity_id: None,
        }
    }

    /// Fetcher restricted to product records.
    pub fn products(source: Arc<dyn RecordSource>) -> Self {
        Self::new(source).with_shape(RecordShape::Product)
    }

    /// Set the batch size. `0` fetches everything in a single batch.
    pub fn set_limit(&mut self, limit: usize) -> &mut Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Set the number of records already exported by earlier runs.
    ///
    /// A nonzero offset makes the very first batch count as started.
    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Continue after a previously persisted last processed id.
    pub fn resume_after(&mut self, last_processed_entity_id: EntityId) -> &mut Self {
        self.cursor = Some(last_processed_entity_id);
        self
    }

    /// Only fetch records assigned to `store_code`.
    pub fn with_store(mut self, store_code: impl Into<String>) -> Self {
        self.store_code = Some(store_code.into());
        self
    }

    pub fn with_shape(mut self, shape: RecordShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn cursor(&self) -> Option<EntityId> {
        self.cursor
    }

    /// Remaining set size reported by the most recent query.
    pub fn total_size(&self) -> Option<usize> {
        self.last_batch.map(|batch| batch.remaining_size)
    }

    /// Fetch the next batch, wrapped as items in ascending id order.
    ///
    /// # Errors
    /// Propagates [`FeedError::SourceUnavailable`] from the source. State is left
    /// untouched on error so the caller may retry the same batch.
    pub fn fetch(&mut self) -> Result<Vec<Item>, FeedError> {
        let query = SourceQuery::new()
            .after(self.cursor)
            .limit(self.limit)
            .store(self.store_code.clone())
            .shape(self.shape);
        debug!(source = %self.source.name(), cursor = ?self.cursor, limit = ?self.limit, offset = self.offset, "fetching batch");

        let page = self.source.query(&query)?;

        let returned = page.records.len();
        self.last_batch = Some(LastBatch {
            offset_at_start: self.offset,
            returned,
            remaining_size: page.remaining_size,
        });
        if let Some(last) = page.records.last() {
            self.cursor = Some(last.entity_id());
            self.last_processed_entity_id = Some(last.entity_id());
        }
        self.offset += returned as u64;

        info!(
            source = %self.source.name(),
            returned,
            remaining_size = page.remaining_size,
            cursor = ?self.cursor,
            done = self.is_done(),
            "batch fetched"
        );
        Ok(page.records.into_iter().map(Item::new).collect())
    }

    /// Whether the most recent batch continues an export already in progress.
    ///
    /// Before the first fetch this reports whether a nonzero offset was seeded.
    pub fn is_started(&self) -> bool {
        match self.last_batch {
            Some(batch) => batch.offset_at_start > 0,
            None => self.offset > 0,
        }
    }

    /// Whether the most recent batch exhausted the remaining records.
    ///
    /// Always `false` before the first fetch.
    pub fn is_done(&self) -> bool {
        let Some(batch) = self.last_batch else {
            return false;
        };
        match self.limit {
            None => true,
            Some(limit) => batch.returned == 0 || batch.remaining_size <= limit,
        }
    }

    /// Id of the last record returned by the most recent non-empty batch.
    ///
    /// # Errors
    /// Returns [`FeedError::NotYetFetched`] until a fetch has returned records.
    pub fn last_processed_entity_id(&self) -> Result<EntityId, FeedError> {
        self.last_processed_entity_id.ok_or(FeedError::NotYetFetched)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("source", &self.source.name())
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("cursor", &self.cursor)
            .field("store_code", &self.store_code)
            .field("shape", &self.shape)
            .finish()
    }
}
