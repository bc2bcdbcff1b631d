//! Error taxonomy for feed extraction.
//!
//! Only infrastructure and programmer errors live here. A single field that
//! cannot be resolved is not an error at this level: the map turns it into a
//! `null` value and the run carries on.

use thiserror::Error;

use crate::RecordShape;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The record source query could not execute. Not retried by the fetcher.
    #[error("record source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// An item wraps a record of the wrong shape for the map it was bound to.
    #[error("item context is not a {expected} (found {found})")]
    InvalidContext { expected: RecordShape, found: RecordShape },

    /// Progress was queried before any batch returned records.
    #[error("no records have been fetched yet")]
    NotYetFetched,

    #[error("configuration error for '{key}': {reason}")]
    Config { key: String, reason: String },
}

impl FeedError {
    /// Create a source unavailable error.
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid context error.
    pub fn invalid_context(expected: RecordShape, found: RecordShape) -> Self {
        Self::InvalidContext { expected, found }
    }

    /// Create a configuration error.
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_messages() {
        let err = FeedError::source_unavailable("catalog", "connection refused");
        assert_eq!(err.to_string(), "record source 'catalog' unavailable: connection refused");

        let err = FeedError::invalid_context(RecordShape::Product, RecordShape::Category);
        assert_eq!(err.to_string(), "item context is not a product (found category)");

        let err = FeedError::config("feed_export/feed_settings/minimal_price", "not a number");
        assert!(matches!(err, FeedError::Config { .. }));
    }
}
