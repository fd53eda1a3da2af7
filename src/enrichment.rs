//! Batch and per-item enrichment.
//!
//! [`aggregate`] ranks the pooled text of all items against the catalog, then
//! ranks each item on its own. Items with blank text get an explicit empty
//! [`Ranking`] without touching the encoder. An item whose embedding fails
//! also gets an empty ranking, and the failure is recorded as an
//! [`ItemFailure`] instead of aborting its siblings.
//!
//! Rankings are kept whole; top-K truncation happens at the reporting
//! boundary through [`EnrichmentResult::batch_top`] and friends.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::EmbeddedCatalog;
use crate::embedding::Encoder;
use crate::error::ConfigError;
use crate::input;
use crate::ranking::{rank, RankedMatch, Ranking, SimilarityMetric};

/// An input text keyed by an identifier such as a gene symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextItem {
    pub id: String,
    pub text: String,
}

impl TextItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Empty or whitespace-only text is never embedded.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read items from a JSON object (`{"id": "text"}`) or a TSV file.
pub fn load_items(path: &Path) -> Result<Vec<TextItem>> {
    let pairs = input::read_pairs(path)
        .with_context(|| format!("failed to load items from {}", path.display()))?;
    let items: Vec<TextItem> = pairs
        .into_iter()
        .map(|(id, text)| TextItem { id, text })
        .collect();
    ensure_unique_ids(&items)?;
    info!(path = %path.display(), items = items.len(), "items loaded");
    Ok(items)
}

/// Knobs for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Default truncation depth for the report views.
    pub top_k: usize,
    pub metric: SimilarityMetric,
    /// Worker threads for the per-item pass. 1 means run inline.
    pub workers: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            metric: SimilarityMetric::Cosine,
            workers: 1,
        }
    }
}

impl From<&crate::config::EnrichmentConfig> for AggregateOptions {
    fn from(config: &crate::config::EnrichmentConfig) -> Self {
        Self {
            top_k: config.top_k,
            metric: config.metric,
            workers: config.workers,
        }
    }
}

/// A per-item failure, reported next to the successful results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub error: String,
}

/// One item's full ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRanking {
    pub id: String,
    pub ranking: Ranking,
}

/// Ranking of the pooled text plus the query vector it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRanking {
    pub query: Vec<f32>,
    pub ranking: Ranking,
}

/// Everything one aggregation run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    model: String,
    top_k: usize,
    batch: BatchRanking,
    items: Vec<ItemRanking>,
    failures: Vec<ItemFailure>,
}

impl EnrichmentResult {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Full batch ranking.
    pub fn batch(&self) -> &Ranking {
        &self.batch.ranking
    }

    /// Embedding of the pooled batch text.
    pub fn batch_query(&self) -> &[f32] {
        &self.batch.query
    }

    /// Batch ranking truncated to `top_k`.
    pub fn batch_top(&self) -> &[RankedMatch] {
        self.batch.ranking.top(self.top_k)
    }

    /// Full ranking for `id`. Every input item has one, possibly empty.
    pub fn item(&self, id: &str) -> Option<&Ranking> {
        self.items.iter().find(|i| i.id == id).map(|i| &i.ranking)
    }

    /// Ranking for `id` truncated to `top_k`.
    pub fn item_top(&self, id: &str) -> Option<&[RankedMatch]> {
        self.item(id).map(|r| r.top(self.top_k))
    }

    /// Per-item rankings in input order.
    pub fn items(&self) -> &[ItemRanking] {
        &self.items
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// The data a 2-D projection needs: the batch query vector plus, for the
    /// top `k` batch matches, each signature's vector and score.
    pub fn visualization(&self, catalog: &EmbeddedCatalog, k: usize) -> Result<VisualizationHandoff> {
        let signatures = self
            .batch
            .ranking
            .top(k)
            .iter()
            .map(|m| -> Result<SignaturePoint> {
                let embedding = catalog
                    .get(&m.label)
                    .with_context(|| format!("signature {} missing from embedded catalog", m.label))?;
                Ok(SignaturePoint {
                    label: m.label.clone(),
                    embedding: embedding.to_vec(),
                    score: m.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VisualizationHandoff {
            model: self.model.clone(),
            query: self.batch.query.clone(),
            signatures,
        })
    }
}

/// One signature in the visualization handoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignaturePoint {
    pub label: String,
    pub embedding: Vec<f32>,
    pub score: f32,
}

/// Input for the external projection/rendering step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationHandoff {
    pub model: String,
    pub query: Vec<f32>,
    pub signatures: Vec<SignaturePoint>,
}

/// Rank the pooled batch text and every item against `catalog`.
///
/// Fails before any embedding for configuration problems: `top_k` or
/// `workers` below 1, an empty catalog, duplicate item ids, or an encoder
/// whose model differs from the one that embedded the catalog. A failure on the batch text is
/// fatal; a failure on one item is recorded and the run continues.
pub fn aggregate(
    items: &[TextItem],
    catalog: &EmbeddedCatalog,
    encoder: &dyn Encoder,
    options: AggregateOptions,
) -> Result<EnrichmentResult> {
    if options.top_k < 1 {
        return Err(ConfigError::InvalidTopK(options.top_k).into());
    }
    if options.workers < 1 {
        return Err(ConfigError::InvalidWorkers(options.workers).into());
    }
    if catalog.is_empty() {
        return Err(ConfigError::EmptyCatalog.into());
    }
    if catalog.model() != encoder.model_name() {
        return Err(ConfigError::ModelMismatch {
            catalog: catalog.model().to_string(),
            encoder: encoder.model_name().to_string(),
        }
        .into());
    }
    ensure_unique_ids(items)?;

    // Step 1: pooled batch text
    let batch_text = items
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let query = encoder
        .embed(&batch_text)
        .context("failed to embed batch text")?;
    let batch_ranking = rank(&query, catalog, options.metric).context("failed to rank batch text")?;

    // Step 2: each item on its own
    let outcomes = rank_items(items, catalog, encoder, options);

    let mut per_item = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for (item, outcome) in items.iter().zip(outcomes) {
        let ranking = match outcome {
            Ok(ranking) => ranking,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(id = %item.id, error = %error, "item failed, continuing with the rest");
                failures.push(ItemFailure {
                    id: item.id.clone(),
                    error,
                });
                Ranking::empty()
            }
        };
        per_item.push(ItemRanking {
            id: item.id.clone(),
            ranking,
        });
    }

    info!(
        items = items.len(),
        failed = failures.len(),
        model = encoder.model_name(),
        "enrichment aggregated"
    );

    Ok(EnrichmentResult {
        model: encoder.model_name().to_string(),
        top_k: options.top_k,
        batch: BatchRanking {
            query,
            ranking: batch_ranking,
        },
        items: per_item,
        failures,
    })
}

/// Rank each item, inline or across scoped worker threads.
///
/// Outcomes come back in input order regardless of which worker finished first.
fn rank_items(
    items: &[TextItem],
    catalog: &EmbeddedCatalog,
    encoder: &dyn Encoder,
    options: AggregateOptions,
) -> Vec<Result<Ranking>> {
    let workers = options.workers.min(items.len());
    if workers <= 1 {
        return items
            .iter()
            .map(|item| rank_item(item, catalog, encoder, options.metric))
            .collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    std::thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|item| rank_item(item, catalog, encoder, options.metric))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

fn rank_item(
    item: &TextItem,
    catalog: &EmbeddedCatalog,
    encoder: &dyn Encoder,
    metric: SimilarityMetric,
) -> Result<Ranking> {
    if item.is_blank() {
        tracing::debug!(id = %item.id, "blank text, empty ranking");
        return Ok(Ranking::empty());
    }
    let query = encoder
        .embed(&item.text)
        .with_context(|| format!("failed to embed text for {}", item.id))?;
    Ok(rank(&query, catalog, metric)?)
}

fn ensure_unique_ids(items: &[TextItem]) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(ConfigError::DuplicateItem(item.id.clone()));
        }
    }
    Ok(())
}
