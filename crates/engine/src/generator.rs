//! Generation loop: fetch a batch, map every item, hand rows to a sink, repeat.
//!
//! Output writing and time-boxing belong to the caller. The generator only
//! guarantees that rows come out in fetch order with fields in the configured
//! order, and that it stops once the fetcher reports the source exhausted.

use anyhow::{Context, Result};
use feed_types::{EntityId, FeedError, FeedRecord};
use tracing::info;

use crate::{
    fetcher::Fetcher,
    map::{FeedMap, MappedItem},
};

/// Receives mapped rows in fetch order.
pub trait FeedSink {
    fn write_record(&mut self, record: FeedRecord) -> Result<()>;
}

impl FeedSink for Vec<FeedRecord> {
    fn write_record(&mut self, record: FeedRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Rows produced by a single fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub records: Vec<FeedRecord>,
    /// Entity id of each row in `records`, same order.
    pub entity_ids: Vec<EntityId>,
    /// Whether this batch continued an export already in progress.
    pub started: bool,
    /// Whether the source is exhausted after this batch.
    pub done: bool,
}

/// Totals for one `run` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub batches: usize,
    pub records: usize,
    /// Last record the sink accepted. Persist this to resume a later run.
    pub last_processed_entity_id: Option<EntityId>,
    pub done: bool,
}

/// Drives one generation run over a fetcher and a map.
pub struct Generator<M: FeedMap> {
    fetcher: Fetcher,
    map: M,
    fields: Vec<String>,
    last_written_entity_id: Option<EntityId>,
}

impl<M: FeedMap> Generator<M> {
    pub fn new<I, S>(fetcher: Fetcher, map: M, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fetcher,
            map,
            fields: fields.into_iter().map(Into::into).collect(),
            last_written_entity_id: None,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Entity id of the last row a sink accepted, across all runs of this generator.
    ///
    /// Trails the fetcher's last processed id when a sink fails partway through
    /// a batch.
    pub fn last_written_entity_id(&self) -> Option<EntityId> {
        self.last_written_entity_id
    }

    /// Output fields in export order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fetch and map one batch.
    ///
    /// # Errors
    /// Source failures and items of the wrong shape are fatal for the batch.
    /// Field-level failures are not: they come back as `null` values.
    pub fn next_batch(&mut self) -> Result<BatchOutcome, FeedError> {
        let items = self.fetcher.fetch()?;

        let mut records = Vec::with_capacity(items.len());
        let mut entity_ids = Vec::with_capacity(items.len());
        for item in &items {
            let mapped = MappedItem::bind(&self.map, item)?;
            records.push(mapped.record(&self.fields));
            entity_ids.push(item.context().entity_id());
        }

        Ok(BatchOutcome {
            records,
            entity_ids,
            started: self.fetcher.is_started(),
            done: self.fetcher.is_done(),
        })
    }

    /// Run until the fetcher reports the source exhausted.
    pub fn run(&mut self, sink: &mut dyn FeedSink) -> Result<GenerationSummary> {
        self.run_batches(sink, usize::MAX)
    }

    /// Run at most `max_batches` batches, stopping early once the source is exhausted.
    ///
    /// Calling again continues where the previous call stopped.
    ///
    /// # Errors
    /// A failing sink stops the run. The fetcher has already moved past the whole
    /// batch by then, so resume from [`Generator::last_written_entity_id`] rather
    /// than from the fetcher's last processed id.
    pub fn run_batches(&mut self, sink: &mut dyn FeedSink, max_batches: usize) -> Result<GenerationSummary> {
        let mut summary = GenerationSummary::default();

        while summary.batches < max_batches {
            let outcome = self.next_batch().context("feed batch failed")?;
            summary.batches += 1;
            summary.records += outcome.records.len();
            for (record, entity_id) in outcome.records.into_iter().zip(outcome.entity_ids) {
                sink.write_record(record)
                    .with_context(|| format!("feed sink rejected record {entity_id}"))?;
                self.last_written_entity_id = Some(entity_id);
            }
            if outcome.done {
                summary.done = true;
                break;
            }
        }

        summary.last_processed_entity_id = self.last_written_entity_id;
        info!(
            batches = summary.batches,
            records = summary.records,
            done = summary.done,
            last_processed_entity_id = ?summary.last_processed_entity_id,
            "feed generation pass finished"
        );
        Ok(summary)
    }
}
