//! Registry of supported sentence-encoder models.
//!
//! The registry is closed: a model name outside this table is a
//! [`ConfigError::UnknownModel`], caught before anything is loaded.

use crate::error::ConfigError;

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

const HF_BASE: &str = "https://huggingface.co/sentence-transformers";

/// Static description of one supported encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub dimensions: usize,
    pub description: &'static str,
    pub domain: &'static str,
    /// BERT-style exports take a third `token_type_ids` input; MPNet exports do not.
    pub token_type_ids: bool,
}

pub const SUPPORTED_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "all-MiniLM-L6-v2",
        dimensions: 384,
        description: "Fast general-purpose sentence encoder",
        domain: "general",
        token_type_ids: true,
    },
    ModelSpec {
        name: "all-MiniLM-L12-v2",
        dimensions: 384,
        description: "Deeper MiniLM variant, slower but more accurate",
        domain: "general",
        token_type_ids: true,
    },
    ModelSpec {
        name: "paraphrase-MiniLM-L6-v2",
        dimensions: 384,
        description: "MiniLM tuned on paraphrase pairs",
        domain: "general",
        token_type_ids: true,
    },
    ModelSpec {
        name: "multi-qa-MiniLM-L6-cos-v1",
        dimensions: 384,
        description: "MiniLM tuned for question/passage retrieval",
        domain: "retrieval",
        token_type_ids: true,
    },
    ModelSpec {
        name: "all-mpnet-base-v2",
        dimensions: 768,
        description: "Highest-quality general sentence encoder in the set",
        domain: "general",
        token_type_ids: false,
    },
];

impl ModelSpec {
    pub fn model_url(&self) -> String {
        format!("{HF_BASE}/{}/resolve/main/onnx/model.onnx", self.name)
    }

    pub fn tokenizer_url(&self) -> String {
        format!("{HF_BASE}/{}/resolve/main/tokenizer.json", self.name)
    }
}

/// Find a model by exact name.
pub fn lookup(name: &str) -> Result<&'static ModelSpec, ConfigError> {
    SUPPORTED_MODELS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ConfigError::UnknownModel {
            name: name.to_string(),
            supported: supported_names(),
        })
}

fn supported_names() -> String {
    SUPPORTED_MODELS
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_registered() {
        let spec = lookup(DEFAULT_MODEL).unwrap();
        assert_eq!(spec.dimensions, 384);
        assert!(spec.token_type_ids);
    }

    #[test]
    fn unknown_model_lists_supported_names() {
        let err = lookup("bert-base-uncased").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bert-base-uncased"));
        assert!(msg.contains("all-MiniLM-L6-v2"));
        assert!(msg.contains("all-mpnet-base-v2"));
    }

    #[test]
    fn urls_point_at_the_named_repo() {
        let spec = lookup("all-mpnet-base-v2").unwrap();
        assert!(spec
            .model_url()
            .ends_with("/all-mpnet-base-v2/resolve/main/onnx/model.onnx"));
        assert!(spec
            .tokenizer_url()
            .ends_with("/all-mpnet-base-v2/resolve/main/tokenizer.json"));
    }

    #[test]
    fn model_names_are_unique() {
        let mut names: Vec<_> = SUPPORTED_MODELS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SUPPORTED_MODELS.len());
    }
}
