use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use sigenrich::catalog::SignatureCatalog;
use sigenrich::config::SigenrichConfig;
use sigenrich::embedding::{self, Encoder};
use sigenrich::ranking::{self, Ranking, SimilarityMetric};

#[derive(clap::Args)]
pub struct RankArgs {
    /// Text to rank against the catalog (blank text is embedded and ranked too)
    #[arg(long)]
    text: String,
    /// Signature catalog (defaults to the configured catalog path)
    #[arg(long)]
    signatures: Option<PathBuf>,
    /// Number of matches to print
    #[arg(long)]
    top_k: Option<usize>,
}

/// Rank a single text from the terminal.
pub async fn rank(mut config: SigenrichConfig, args: RankArgs) -> Result<()> {
    if let Some(top_k) = args.top_k {
        config.enrichment.top_k = top_k;
    }
    config.validate()?;

    let catalog_path = args
        .signatures
        .unwrap_or_else(|| config.resolved_catalog_path());
    let catalog = SignatureCatalog::load(&catalog_path)?;

    let embedding_config = config.embedding.clone();
    let encoder: Arc<dyn Encoder> = Arc::from(
        tokio::task::spawn_blocking(move || embedding::create_encoder(&embedding_config))
            .await??,
    );

    let metric = config.enrichment.metric;
    let text = args.text;
    let ranking =
        tokio::task::spawn_blocking(move || rank_text(&catalog, encoder.as_ref(), &text, metric))
            .await??;

    println!("Top {} of {} signature(s):\n", config.enrichment.top_k.min(ranking.len()), ranking.len());
    for (i, m) in ranking.top(config.enrichment.top_k).iter().enumerate() {
        println!("  {}. {} (score: {:.4})", i + 1, m.label, m.score);
    }

    Ok(())
}

/// Embed `text` as given, blank or not, and rank it against `catalog`.
fn rank_text(
    catalog: &SignatureCatalog,
    encoder: &dyn Encoder,
    text: &str,
    metric: SimilarityMetric,
) -> Result<Ranking> {
    let embedded = catalog.embed_all(encoder)?;
    let query = encoder.embed(text)?;
    Ok(ranking::rank(&query, &embedded, metric)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One axis per keyword; text without keywords embeds to the zero vector.
    struct KeywordEncoder;

    impl Encoder for KeywordEncoder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![
                text.contains("apoptosis") as u8 as f32,
                text.contains("immune") as u8 as f32,
            ])
        }
    }

    fn catalog() -> SignatureCatalog {
        SignatureCatalog::from_pairs([
            ("Apoptosis", "apoptosis"),
            ("Immune Response", "immune"),
        ])
        .unwrap()
    }

    #[test]
    fn blank_text_still_gets_a_full_ranking() {
        for text in ["", "   "] {
            let ranking = rank_text(&catalog(), &KeywordEncoder, text, SimilarityMetric::Cosine).unwrap();
            let labels: Vec<_> = ranking.iter().map(|m| m.label.as_str()).collect();
            assert_eq!(labels, vec!["Apoptosis", "Immune Response"]);
            assert!(ranking.iter().all(|m| m.score == 0.0));
        }
    }

    #[test]
    fn text_ranks_matching_signature_first() {
        let ranking =
            rank_text(&catalog(), &KeywordEncoder, "immune signaling", SimilarityMetric::Cosine).unwrap();
        assert_eq!(ranking.first().unwrap().label, "Immune Response");
    }
}
