//! CLI `run` command — full batch + per-item enrichment with reports.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use sigenrich::catalog::SignatureCatalog;
use sigenrich::config::SigenrichConfig;
use sigenrich::embedding::{self, Encoder};
use sigenrich::enrichment::{self, AggregateOptions};
use sigenrich::report;

#[derive(clap::Args)]
pub struct RunArgs {
    /// Item texts: JSON object `{"id": "text"}` or TSV `id<TAB>text`
    #[arg(long)]
    items: PathBuf,
    /// Signature catalog (defaults to the configured catalog path)
    #[arg(long)]
    signatures: Option<PathBuf>,
    /// Embedding model name (see `sigenrich models`)
    #[arg(long)]
    model: Option<String>,
    /// Number of matches kept in each report
    #[arg(long)]
    top_k: Option<usize>,
    /// Worker threads for per-item ranking
    #[arg(long)]
    workers: Option<usize>,
    /// Results directory
    #[arg(long)]
    out: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut SigenrichConfig) {
        if let Some(model) = &self.model {
            config.embedding.model = model.clone();
        }
        if let Some(top_k) = self.top_k {
            config.enrichment.top_k = top_k;
        }
        if let Some(workers) = self.workers {
            config.enrichment.workers = workers;
        }
        if let Some(signatures) = &self.signatures {
            config.catalog.path = signatures.to_string_lossy().into_owned();
        }
        if let Some(out) = &self.out {
            config.output.results_dir = out.to_string_lossy().into_owned();
        }
    }
}

/// Load inputs, embed the catalog once, aggregate, print and write reports.
pub async fn run(mut config: SigenrichConfig, args: RunArgs) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let items = enrichment::load_items(&args.items)?;
    let catalog = SignatureCatalog::load(&config.resolved_catalog_path())?;

    println!(
        "Ranking {} item(s) against {} signature(s) with model '{}'...",
        items.len(),
        catalog.len(),
        config.embedding.model
    );

    // Load the model once, before any per-item work.
    let embedding_config = config.embedding.clone();
    let encoder: Arc<dyn Encoder> = Arc::from(
        tokio::task::spawn_blocking(move || embedding::create_encoder(&embedding_config))
            .await?
            .context("failed to create encoder")?,
    );

    let options = AggregateOptions::from(&config.enrichment);
    let visualization_top_k = config.enrichment.visualization_top_k;
    let (items, result, handoff) = tokio::task::spawn_blocking(move || -> Result<_> {
        let embedded = catalog.embed_all(encoder.as_ref())?;
        let result = enrichment::aggregate(&items, &embedded, encoder.as_ref(), options)?;
        let handoff = result.visualization(&embedded, visualization_top_k)?;
        Ok((items, result, handoff))
    })
    .await??;

    println!("\nTop enriched signatures:");
    println!("{}", report::format_matches(result.batch_top()));

    if !result.failures().is_empty() {
        eprintln!("\n{} item(s) failed:", result.failures().len());
        for failure in result.failures() {
            eprintln!("  {}: {}", failure.id, failure.error);
        }
    }

    let results_dir = config.resolved_results_dir();
    let written = report::write_reports(
        &results_dir,
        &items,
        &result,
        &handoff,
        config.enrichment.metric,
    )?;

    println!();
    for path in written {
        println!("Saved {}", path.display());
    }

    Ok(())
}
