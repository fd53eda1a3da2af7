//! CLI `doctor` command — check configuration, model files and catalog.

use anyhow::Result;

use sigenrich::catalog::SignatureCatalog;
use sigenrich::config::SigenrichConfig;

/// Run diagnostics and print a health report.
pub fn doctor(config: &SigenrichConfig) -> Result<()> {
    println!("sigenrich Health Report");
    println!("=======================");
    println!();

    println!("Configuration:");
    println!("  Model:           {}", config.embedding.model);
    println!("  Metric:          {}", config.enrichment.metric);
    println!("  top_k:           {}", config.enrichment.top_k);
    println!("  Workers:         {}", config.enrichment.workers);
    match config.validate() {
        Ok(()) => println!("  Status:          OK"),
        Err(e) => println!("  Status:          INVALID ({e})"),
    }
    println!();

    let model_dir = config.embedding.model_dir();
    println!("Model files ({}):", model_dir.display());
    let mut model_ok = true;
    for file in ["model.onnx", "tokenizer.json"] {
        let present = model_dir.join(file).exists();
        model_ok &= present;
        println!(
            "  {file:<16} {}",
            if present { "present" } else { "MISSING" }
        );
    }
    if !model_ok {
        println!("  Run `sigenrich model download --model {}`.", config.embedding.model);
    }
    println!();

    let catalog_path = config.resolved_catalog_path();
    println!("Signature catalog ({}):", catalog_path.display());
    if !catalog_path.exists() {
        println!("  Status:          not found");
    } else {
        match SignatureCatalog::load(&catalog_path) {
            Ok(catalog) => {
                println!("  Signatures:      {}", catalog.len());
                println!("  Status:          OK");
            }
            Err(e) => println!("  Status:          FAILED ({e:#})"),
        }
    }

    Ok(())
}
