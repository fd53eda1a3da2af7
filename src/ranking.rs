//! Brute-force similarity ranking of one query vector against a catalog.
//!
//! [`rank`] scores every catalog label and returns a complete [`Ranking`],
//! sorted by descending score with ties kept in catalog order. Truncation to
//! a top-K view is left to the caller via [`Ranking::top`].

use serde::{Deserialize, Serialize};

use crate::catalog::EmbeddedCatalog;
use crate::error::RankError;

/// How a query vector is compared with a catalog vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Dot product over the product of norms. Zero-norm vectors score 0.
    #[default]
    Cosine,
    /// Raw dot product. Equivalent to cosine for L2-normalized encoders.
    Dot,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
        }
    }

    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Dot => dot(a, b),
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            _ => Err(format!("unknown similarity metric: {s}")),
        }
    }
}

/// One catalog label and its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub label: String,
    pub score: f32,
}

/// Every catalog label ordered by descending score.
///
/// Immutable once built. An empty ranking is the explicit result for items
/// that had no text or failed to embed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    matches: Vec<RankedMatch>,
}

impl Ranking {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The best match, if any.
    pub fn first(&self) -> Option<&RankedMatch> {
        self.matches.first()
    }

    /// The leading `k` matches (all of them if `k` exceeds the length).
    pub fn top(&self, k: usize) -> &[RankedMatch] {
        &self.matches[..k.min(self.matches.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedMatch> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[RankedMatch] {
        &self.matches
    }

    /// Score for `label`, if it is part of this ranking.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.matches.iter().find(|m| m.label == label).map(|m| m.score)
    }
}

/// Score `query` against every vector in `catalog` and sort the result.
///
/// Fails only if the query's dimensionality differs from the catalog's,
/// which means the two were produced by different encoders.
pub fn rank(
    query: &[f32],
    catalog: &EmbeddedCatalog,
    metric: SimilarityMetric,
) -> Result<Ranking, RankError> {
    if metric == SimilarityMetric::Cosine && norm(query) == 0.0 {
        tracing::warn!("zero-norm query vector, every signature scores 0");
    }

    let mut matches = Vec::with_capacity(catalog.len());
    for (label, vector) in catalog.iter() {
        if vector.len() != query.len() {
            return Err(RankError::DimensionMismatch {
                label: label.to_string(),
                expected: vector.len(),
                actual: query.len(),
            });
        }
        let score = metric.score(query, vector);
        matches.push(RankedMatch {
            label: label.to_string(),
            // -0.0 sorts below 0.0 under total_cmp; fold it so zero scores tie.
            score: if score == 0.0 { 0.0 } else { score },
        });
    }

    // sort_by is stable: equal scores keep catalog order.
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(labels = matches.len(), %metric, "ranked query against catalog");
    Ok(Ranking { matches })
}

/// Cosine similarity in `[-1, 1]`. Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
