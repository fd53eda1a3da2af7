//! Signature catalog — labeled reference descriptions and their embeddings.
//!
//! [`SignatureCatalog`] holds the descriptions in source order and refuses
//! duplicate labels. [`SignatureCatalog::embed_all`] turns it into an
//! [`EmbeddedCatalog`] with exactly the same labels, memoized per model name so
//! the catalog is embedded at most once per encoder in a run.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::embedding::Encoder;
use crate::error::ConfigError;
use crate::input;
use crate::ranking::norm;

/// Descriptions are embedded this many at a time.
const BATCH_SIZE: usize = 32;

/// A labeled reference description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureEntry {
    pub label: String,
    pub description: String,
}

/// Reference descriptions in source order, with per-model embedding cache.
#[derive(Debug)]
pub struct SignatureCatalog {
    entries: Vec<SignatureEntry>,
    embedded: Mutex<HashMap<String, Arc<EmbeddedCatalog>>>,
}

impl SignatureCatalog {
    /// Load a catalog from a JSON object (`{"label": "description"}`) or a TSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let pairs = input::read_pairs(path)
            .with_context(|| format!("failed to load signature catalog {}", path.display()))?;
        let catalog = Self::from_pairs(pairs)?;
        info!(path = %path.display(), signatures = catalog.len(), "signature catalog loaded");
        Ok(catalog)
    }

    /// Build a catalog, rejecting duplicates, empty descriptions and empty input.
    pub fn from_pairs<L, D>(pairs: impl IntoIterator<Item = (L, D)>) -> Result<Self, ConfigError>
    where
        L: Into<String>,
        D: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (label, description) in pairs {
            let label = label.into();
            let description = description.into();
            if description.trim().is_empty() {
                return Err(ConfigError::EmptyDescription(label));
            }
            if !seen.insert(label.clone()) {
                return Err(ConfigError::DuplicateLabel(label));
            }
            entries.push(SignatureEntry { label, description });
        }

        if entries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        Ok(Self {
            entries,
            embedded: Mutex::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&SignatureEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Embed every description with `encoder`.
    ///
    /// The result is cached under the encoder's model name; later calls for
    /// the same model return the cached catalog without touching the encoder.
    pub fn embed_all(&self, encoder: &dyn Encoder) -> Result<Arc<EmbeddedCatalog>> {
        let model = encoder.model_name();
        let mut cache = self
            .embedded
            .lock()
            .map_err(|e| anyhow::anyhow!("catalog cache lock poisoned: {e}"))?;

        if let Some(embedded) = cache.get(model) {
            tracing::debug!(model, "reusing embedded catalog");
            return Ok(Arc::clone(embedded));
        }

        let mut vectors = Vec::with_capacity(self.entries.len());
        for chunk in self.entries.chunks(BATCH_SIZE) {
            let texts: Vec<&str> = chunk.iter().map(|e| e.description.as_str()).collect();
            let embeddings = encoder
                .embed_batch(&texts)
                .context("failed to embed signature descriptions")?;
            anyhow::ensure!(
                embeddings.len() == chunk.len(),
                "encoder returned {} vectors for {} descriptions",
                embeddings.len(),
                chunk.len()
            );

            for (entry, vector) in chunk.iter().zip(embeddings) {
                anyhow::ensure!(
                    vector.len() == encoder.dimensions(),
                    "signature {} embedded to {} dimensions, expected {}",
                    entry.label,
                    vector.len(),
                    encoder.dimensions()
                );
                if norm(&vector) == 0.0 {
                    warn!(label = %entry.label, "zero-norm signature vector, it will score 0 against every query");
                }
                vectors.push((entry.label.clone(), vector));
            }
        }

        let embedded = Arc::new(EmbeddedCatalog::from_vectors(model, vectors));
        info!(model, signatures = embedded.len(), dimensions = embedded.dimensions(), "signature catalog embedded");
        cache.insert(model.to_string(), Arc::clone(&embedded));
        Ok(embedded)
    }
}

/// Signature vectors for one encoder, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedCatalog {
    model: String,
    dimensions: usize,
    vectors: Vec<(String, Vec<f32>)>,
}

impl EmbeddedCatalog {
    /// Wrap precomputed vectors. Dimensionality is taken from the first vector.
    pub fn from_vectors(model: impl Into<String>, vectors: Vec<(String, Vec<f32>)>) -> Self {
        let dimensions = vectors.first().map_or(0, |(_, v)| v.len());
        Self {
            model: model.into(),
            dimensions,
            vectors,
        }
    }

    /// Model name the vectors were produced with.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.vectors.iter().map(|(l, v)| (l.as_str(), v.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.vectors.iter().map(|(l, _)| l.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&[f32]> {
        self.vectors
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encodes text length into a 2-dim vector and counts calls.
    struct LengthEncoder {
        calls: AtomicUsize,
    }

    impl Encoder for LengthEncoder {
        fn model_name(&self) -> &str {
            "length"
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn sample() -> SignatureCatalog {
        SignatureCatalog::from_pairs([
            ("Apoptosis", "programmed cell death pathway"),
            ("Immune Response", "T-cell activation and cytokine signaling"),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_labels_are_fatal() {
        let err = SignatureCatalog::from_pairs([
            ("Apoptosis", "cell death"),
            ("Apoptosis", "programmed cell death"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLabel("Apoptosis".into()));
    }

    #[test]
    fn empty_catalog_and_descriptions_are_fatal() {
        let empty: Vec<(String, String)> = vec![];
        assert_eq!(
            SignatureCatalog::from_pairs(empty).unwrap_err(),
            ConfigError::EmptyCatalog
        );
        assert_eq!(
            SignatureCatalog::from_pairs([("Hypoxia", "   ")]).unwrap_err(),
            ConfigError::EmptyDescription("Hypoxia".into())
        );
    }

    #[test]
    fn embedded_catalog_shares_labels_and_order() {
        let catalog = sample();
        let encoder = LengthEncoder { calls: AtomicUsize::new(0) };
        let embedded = catalog.embed_all(&encoder).unwrap();

        let source: Vec<_> = catalog.entries().iter().map(|e| e.label.as_str()).collect();
        let embedded_labels: Vec<_> = embedded.labels().collect();
        assert_eq!(source, embedded_labels);
        assert_eq!(embedded.model(), "length");
        assert_eq!(embedded.dimensions(), 2);
        assert_eq!(embedded.get("Apoptosis"), Some(&[29.0, 1.0][..]));
    }

    #[test]
    fn embed_all_is_memoized_per_model() {
        let catalog = sample();
        let encoder = LengthEncoder { calls: AtomicUsize::new(0) };

        let first = catalog.embed_all(&encoder).unwrap();
        let calls_after_first = encoder.calls.load(Ordering::SeqCst);
        assert_eq!(calls_after_first, 2);

        let second = catalog.embed_all(&encoder).unwrap();
        assert_eq!(encoder.calls.load(Ordering::SeqCst), calls_after_first);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn load_rejects_duplicate_json_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("signatures.json");
        std::fs::write(
            &path,
            r#"{"Apoptosis": "cell death", "Hypoxia": "low oxygen", "Apoptosis": "again"}"#,
        )
        .unwrap();

        let err = SignatureCatalog::load(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateLabel("Apoptosis".into()))
        );
    }
}
