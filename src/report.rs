//! JSON reports for a finished enrichment run.
//!
//! Every file is written to a temp path and renamed into place, so a crashed
//! run never leaves a half-written report behind. Maps keyed by item id or
//! signature label keep input/ranking order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::enrichment::{EnrichmentResult, SignaturePoint, TextItem, VisualizationHandoff};
use crate::ranking::{RankedMatch, SimilarityMetric};

pub const ITEM_TEXTS_FILE: &str = "item_texts.json";
pub const TOP_MATCHES_FILE: &str = "top_matches.json";
pub const PER_ITEM_FILE: &str = "per_item_top_matches.json";
pub const FAILURES_FILE: &str = "item_failures.json";
pub const EMBEDDING_MAP_FILE: &str = "embedding_map.json";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Counts and settings describing one run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub model: String,
    pub metric: SimilarityMetric,
    pub top_k: usize,
    pub visualization_top_k: usize,
    pub signatures: usize,
    pub items: usize,
    pub blank_items: usize,
    pub failed_items: usize,
    pub generated_at: String,
}

impl RunSummary {
    pub fn new(
        items: &[TextItem],
        result: &EnrichmentResult,
        handoff: &VisualizationHandoff,
        metric: SimilarityMetric,
    ) -> Self {
        Self {
            model: result.model().to_string(),
            metric,
            top_k: result.top_k(),
            visualization_top_k: handoff.signatures.len(),
            signatures: result.batch().len(),
            items: items.len(),
            blank_items: items.iter().filter(|i| i.is_blank()).count(),
            failed_items: result.failures().len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write every report file into `dir`, creating it if needed.
///
/// Returns the paths written, in a stable order.
pub fn write_reports(
    dir: &Path,
    items: &[TextItem],
    result: &EnrichmentResult,
    handoff: &VisualizationHandoff,
    metric: SimilarityMetric,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create results dir: {}", dir.display()))?;

    let mut written = Vec::with_capacity(6);

    written.push(write_json(&dir.join(ITEM_TEXTS_FILE), &ItemTexts(items))?);
    written.push(write_json(
        &dir.join(TOP_MATCHES_FILE),
        &result.batch_top(),
    )?);
    written.push(write_json(&dir.join(PER_ITEM_FILE), &PerItemTop(result))?);
    written.push(write_json(&dir.join(FAILURES_FILE), &result.failures())?);
    written.push(write_json(
        &dir.join(EMBEDDING_MAP_FILE),
        &EmbeddingMap {
            model: &handoff.model,
            query: &handoff.query,
            signatures: SignatureMap(&handoff.signatures),
        },
    )?);
    written.push(write_json(
        &dir.join(SUMMARY_FILE),
        &RunSummary::new(items, result, handoff, metric),
    )?);

    tracing::info!(dir = %dir.display(), files = written.len(), "reports written");
    Ok(written)
}

/// One line per match: `label (score: 0.1234)`.
pub fn format_matches(matches: &[RankedMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("{} (score: {:.4})", m.label, m.score))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize `value` as pretty JSON to `path` via temp file + rename.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)
        .with_context(|| format!("failed to write temp file: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename temp file to {}", path.display()))?;

    Ok(path.to_path_buf())
}

/// `{"id": "text"}` in input order.
struct ItemTexts<'a>(&'a [TextItem]);

impl Serialize for ItemTexts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|i| (&i.id, &i.text)))
    }
}

/// `{"id": [{label, score}, ...]}` truncated to `top_k`, in input order.
struct PerItemTop<'a>(&'a EnrichmentResult);

impl Serialize for PerItemTop<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let top_k = self.0.top_k();
        serializer.collect_map(
            self.0
                .items()
                .iter()
                .map(|i| (&i.id, i.ranking.top(top_k))),
        )
    }
}

#[derive(Serialize)]
struct EmbeddingMap<'a> {
    model: &'a str,
    query: &'a [f32],
    signatures: SignatureMap<'a>,
}

/// `{"label": {"embedding": [...], "score": x}}` in ranking order.
struct SignatureMap<'a>(&'a [SignaturePoint]);

#[derive(Serialize)]
struct PointView<'a> {
    embedding: &'a [f32],
    score: f32,
}

impl Serialize for SignatureMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| {
            (
                &p.label,
                PointView {
                    embedding: &p.embedding,
                    score: p.score,
                },
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_matches_uses_four_decimals() {
        let matches = vec![
            RankedMatch {
                label: "Apoptosis".into(),
                score: 0.61234,
            },
            RankedMatch {
                label: "Immune Response".into(),
                score: 0.1,
            },
        ];
        assert_eq!(
            format_matches(&matches),
            "Apoptosis (score: 0.6123)\nImmune Response (score: 0.1000)"
        );
    }

    #[test]
    fn item_texts_keep_input_order() {
        let items = vec![TextItem::new("ZNF1", "zinc finger"), TextItem::new("ABL1", "kinase")];
        let json = serde_json::to_string(&ItemTexts(&items)).unwrap();
        assert_eq!(json, r#"{"ZNF1":"zinc finger","ABL1":"kinase"}"#);
    }

    #[test]
    fn signature_map_nests_embedding_and_score() {
        let points = vec![SignaturePoint {
            label: "Hypoxia".into(),
            embedding: vec![0.5, 0.5],
            score: 0.25,
        }];
        let json = serde_json::to_value(SignatureMap(&points)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Hypoxia": {"embedding": [0.5, 0.5], "score": 0.25}})
        );
    }
}
