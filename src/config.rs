use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::embedding::models;
use crate::error::ConfigError;
use crate::ranking::SimilarityMetric;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SigenrichConfig {
    pub logging: LoggingConfig,
    pub embedding: EmbeddingConfig,
    pub enrichment: EnrichmentConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub top_k: usize,
    pub visualization_top_k: usize,
    pub metric: SimilarityMetric,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub results_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_sigenrich_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: models::DEFAULT_MODEL.into(),
            cache_dir,
        }
    }
}

impl EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json` for the configured model.
    pub fn model_dir(&self) -> PathBuf {
        expand_tilde(&self.cache_dir).join(&self.model)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            visualization_top_k: 5,
            metric: SimilarityMetric::Cosine,
            workers: 1,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let path = default_sigenrich_dir()
            .join("signatures.json")
            .to_string_lossy()
            .into_owned();
        Self { path }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".into(),
        }
    }
}

/// Returns `~/.sigenrich/`, or `./.sigenrich/` when no home directory is known.
pub fn default_sigenrich_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sigenrich")
}

/// Returns the default config file path: `~/.sigenrich/config.toml`
pub fn default_config_path() -> PathBuf {
    default_sigenrich_dir().join("config.toml")
}

impl SigenrichConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SigenrichConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (SIGENRICH_MODEL, SIGENRICH_TOP_K, SIGENRICH_CATALOG, SIGENRICH_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SIGENRICH_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("SIGENRICH_TOP_K") {
            match val.parse() {
                Ok(top_k) => self.enrichment.top_k = top_k,
                Err(_) => warn!(value = %val, "ignoring non-numeric SIGENRICH_TOP_K"),
            }
        }
        if let Ok(val) = std::env::var("SIGENRICH_CATALOG") {
            self.catalog.path = val;
        }
        if let Ok(val) = std::env::var("SIGENRICH_LOG_LEVEL") {
            self.logging.log_level = val;
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    ///
    /// Called before the encoder is loaded, so a bad model name or `top_k`
    /// never costs a model load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.provider != "local" {
            return Err(ConfigError::UnknownProvider(self.embedding.provider.clone()));
        }
        models::lookup(&self.embedding.model)?;
        if self.enrichment.top_k < 1 {
            return Err(ConfigError::InvalidTopK(self.enrichment.top_k));
        }
        if self.enrichment.visualization_top_k < 1 {
            return Err(ConfigError::InvalidTopK(self.enrichment.visualization_top_k));
        }
        if self.enrichment.workers < 1 {
            return Err(ConfigError::InvalidWorkers(self.enrichment.workers));
        }
        Ok(())
    }

    /// Resolve the signature catalog path, expanding `~` if needed.
    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_tilde(&self.catalog.path)
    }

    pub fn resolved_results_dir(&self) -> PathBuf {
        expand_tilde(&self.output.results_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
