//! Semantic signature enrichment for gene function summaries.
//!
//! sigenrich ranks a set of free-text descriptions (typically one summary per
//! gene) against a small catalog of labeled reference descriptions, the
//! biological "signatures", by embedding similarity. It reports one ranking
//! for the pooled text of the whole set and one per item, plus the vectors an
//! external tool needs to draw a 2-D map of the top matches.
//!
//! # Pipeline
//!
//! ```text
//! items ──▶ Encoder ──▶ query vectors ──▶ rank() ──▶ Ranking ──▶ aggregate() ──▶ reports
//!                              ▲
//! catalog ──▶ embed_all() ─────┘
//! ```
//!
//! - **Embeddings**: Local ONNX Runtime sentence-transformers (all-MiniLM-L6-v2 by default)
//! - **Scoring**: Brute-force cosine (or dot) similarity over the whole catalog
//! - **Granularity**: Batch ranking of the pooled text plus independent per-item rankings
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`error`] — Configuration and ranking error types
//! - [`input`] — Ordered key/text pairs from JSON or TSV files
//! - [`embedding`] — Text-to-vector encoders and the supported model registry
//! - [`catalog`] — Signature catalog loading and per-model embedding
//! - [`ranking`] — Similarity metrics and complete, stably sorted rankings
//! - [`enrichment`] — Batch and per-item aggregation with per-item failure isolation
//! - [`report`] — JSON report files for a finished run

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod enrichment;
pub mod error;
pub mod input;
pub mod ranking;
pub mod report;
