//! Text-to-vector embedding pipeline.
//!
//! Provides the [`Encoder`] trait and a local implementation using ONNX
//! Runtime sentence encoders from the [`models`] registry. An encoder is an
//! explicit resource: build it once with [`create_encoder`] before any
//! per-item work and pass it by reference. There is no process-wide cache.

pub mod local;
pub mod models;

use anyhow::Result;

use crate::error::ConfigError;

/// Trait for embedding text into vectors.
///
/// Vectors from one encoder are only comparable with vectors from the same
/// encoder. Empty text must still produce a vector of [`Encoder::dimensions`]
/// length. All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait Encoder: Send + Sync {
    /// Registry name of the model behind this encoder.
    fn model_name(&self) -> &str;

    /// Number of dimensions every produced vector has.
    fn dimensions(&self) -> usize;

    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Create an encoder from config.
///
/// Provider and model name are validated first. Only `"local"` is supported
/// (ONNX Runtime). Returns an error if model files are not found; run
/// `sigenrich model download` first.
pub fn create_encoder(config: &crate::config::EmbeddingConfig) -> Result<Box<dyn Encoder>> {
    match config.provider.as_str() {
        "local" => {
            let spec = models::lookup(&config.model)?;
            let encoder = local::LocalEncoder::new(spec, &config.model_dir())?;
            Ok(Box::new(encoder))
        }
        other => Err(ConfigError::UnknownProvider(other.to_string()).into()),
    }
}
