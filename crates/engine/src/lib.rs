//! # Feed Engine
//!
//! Extracts catalog records in bounded batches and maps each one into a flat
//! set of named feed attributes.
//!
//! ## Architecture
//!
//! - **`source`**: record source contract (`id > cursor` filter, ascending order, remaining size)
//! - **`fetcher`**: cursor-paginated batch walker with started/done progress tracking
//! - **`item`**: fetched record wrapper with per-field memoization
//! - **`helper`**: domain helper contract and a catalog-backed implementation
//! - **`map`**: resolver registry plus the product and base maps
//! - **`generator`**: fetch, map, and sink loop for one generation run
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use feed_engine::{
//!     CatalogProductHelper, Fetcher, Generator, MemoryRecordSource, ProductMap, StoreContext,
//! };
//! use feed_types::{CatalogRecord, FeedConfig, FeedRecord, ProductRecord};
//!
//! let source = Arc::new(MemoryRecordSource::with_records(
//!     "catalog",
//!     (1..=3).map(|id| CatalogRecord::from(ProductRecord { entity_id: id, price: Some(9.5), ..Default::default() })),
//! ));
//! let mut fetcher = Fetcher::products(source);
//! fetcher.set_limit(2);
//!
//! let helper = Arc::new(CatalogProductHelper::new(StoreContext::default()));
//! let map = ProductMap::new(helper, FeedConfig::default());
//! let mut generator = Generator::new(fetcher, map, ["df_id", "price"]);
//!
//! let mut rows: Vec<FeedRecord> = Vec::new();
//! let summary = generator.run(&mut rows)?;
//! assert_eq!(summary.records, 3);
//! assert_eq!(rows[0]["price"], "9.50");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod fetcher;
pub mod generator;
pub mod helper;
pub mod item;
pub mod map;
pub mod source;

// Re-export commonly used types for convenience
pub use fetcher::Fetcher;
pub use generator::{BatchOutcome, FeedSink, GenerationSummary, Generator};
pub use helper::{Availability, CatalogProductHelper, ProductHelper, StoreContext};
pub use item::Item;
pub use map::{BaseMap, FeedMap, FieldResolver, MappedItem, ProductMap, ResolveContext, ResolverRegistry};
pub use source::{MemoryRecordSource, RecordSource, SourcePage, SourceQuery};
