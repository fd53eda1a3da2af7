//! Typed errors for the enrichment pipeline.
//!
//! [`ConfigError`] is fatal and raised before any embedding work starts.
//! [`RankError`] guards the ranker against vectors from mismatched encoders.
//! Per-item failures are not errors at this level; they are collected as
//! [`crate::enrichment::ItemFailure`] values alongside the results.

use thiserror::Error;

/// Invalid run configuration or input. Aborts the run with no partial output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate signature label: {0}")]
    DuplicateLabel(String),

    #[error("signature catalog is empty")]
    EmptyCatalog,

    #[error("signature {0} has an empty description")]
    EmptyDescription(String),

    #[error("duplicate item identifier: {0}")]
    DuplicateItem(String),

    #[error("unknown embedding model: {name}. Supported: {supported}")]
    UnknownModel { name: String, supported: String },

    #[error("unknown embedding provider: {0}. Supported: local")]
    UnknownProvider(String),

    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    #[error("workers must be at least 1, got {0}")]
    InvalidWorkers(usize),

    #[error("catalog was embedded with model {catalog}, but the encoder is {encoder}")]
    ModelMismatch { catalog: String, encoder: String },
}

/// A query could not be compared against the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("dimension mismatch for {label}: query has {actual} dimensions, catalog has {expected}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}
