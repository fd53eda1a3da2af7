#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use sigenrich::catalog::SignatureCatalog;
use sigenrich::embedding::Encoder;
use sigenrich::enrichment::TextItem;

/// Concept axes and the words that load onto them.
const LEXICON: &[(usize, &[&str])] = &[
    (0, &["apoptosis", "apoptotic", "death", "programmed", "caspase"]),
    (1, &["immune", "t-cell", "cytokine", "activation", "interleukin", "inflammation"]),
    (2, &["dna", "damage", "repair", "genome", "replication"]),
    (3, &["glucose", "glycolysis", "insulin", "metabolism"]),
];

pub const CONCEPT_DIMS: usize = 4;

/// Deterministic bag-of-concepts encoder. Words outside the lexicon are
/// ignored, so text without concept words embeds to the zero vector.
pub struct ConceptEncoder;

impl Encoder for ConceptEncoder {
    fn model_name(&self) -> &str {
        "concept-test"
    }

    fn dimensions(&self) -> usize {
        CONCEPT_DIMS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; CONCEPT_DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
        {
            for (axis, words) in LEXICON {
                if words.contains(&word) {
                    v[*axis] += 1.0;
                }
            }
        }
        Ok(v)
    }
}

/// Records every text it is asked to embed, then delegates.
pub struct CountingEncoder<E> {
    inner: E,
    calls: Mutex<Vec<String>>,
}

impl<E: Encoder> CountingEncoder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl<E: Encoder> Encoder for CountingEncoder<E> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        self.inner.embed(text)
    }
}

/// Fails for any text exactly equal to one of `fail_on`, delegates otherwise.
pub struct FailingEncoder<E> {
    inner: E,
    fail_on: HashSet<String>,
}

impl<E: Encoder> FailingEncoder<E> {
    pub fn new(inner: E, fail_on: &[&str]) -> Self {
        Self {
            inner,
            fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl<E: Encoder> Encoder for FailingEncoder<E> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_on.contains(text) {
            anyhow::bail!("malformed text encoding");
        }
        self.inner.embed(text)
    }
}

/// The two-signature catalog from the worked example.
pub fn example_catalog() -> SignatureCatalog {
    SignatureCatalog::from_pairs([
        ("Apoptosis", "programmed cell death pathway"),
        ("Immune Response", "T-cell activation and cytokine signaling"),
    ])
    .unwrap()
}

/// A four-signature catalog, one signature per concept axis.
pub fn concept_catalog() -> SignatureCatalog {
    SignatureCatalog::from_pairs([
        ("Apoptosis", "programmed cell death pathway"),
        ("Immune Response", "T-cell activation and cytokine signaling"),
        ("DNA Repair", "repair of DNA damage during replication"),
        ("Glucose Metabolism", "glycolysis and insulin driven glucose uptake"),
    ])
    .unwrap()
}

pub fn items(pairs: &[(&str, &str)]) -> Vec<TextItem> {
    pairs.iter().map(|(id, text)| TextItem::new(*id, *text)).collect()
}
