mod helpers;

use helpers::{items, ConceptEncoder, CONCEPT_DIMS};
use sigenrich::catalog::SignatureCatalog;
use sigenrich::enrichment::{aggregate, load_items, AggregateOptions};
use sigenrich::error::ConfigError;
use sigenrich::ranking::{rank, SimilarityMetric};
use tempfile::TempDir;

#[test]
fn load_json_catalog_preserves_source_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("signatures.json");
    std::fs::write(
        &path,
        r#"{
  "Immune Response": "T-cell activation and cytokine signaling",
  "Apoptosis": "programmed cell death pathway",
  "DNA Repair": "repair of DNA damage"
}"#,
    )
    .unwrap();

    let catalog = SignatureCatalog::load(&path).unwrap();
    let labels: Vec<_> = catalog.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["Immune Response", "Apoptosis", "DNA Repair"]);
    assert_eq!(
        catalog.get("Apoptosis").unwrap().description,
        "programmed cell death pathway"
    );
}

#[test]
fn empty_catalog_file_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("signatures.json");
    std::fs::write(&path, "{}").unwrap();

    let err = SignatureCatalog::load(&path).unwrap_err();
    assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::EmptyCatalog));
}

#[test]
fn missing_catalog_file_names_the_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nope.json");
    let err = SignatureCatalog::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));
}

#[test]
fn degenerate_signature_scores_zero_but_stays_ranked() {
    // "Housekeeping" has no concept words, so it embeds to the zero vector.
    let catalog = SignatureCatalog::from_pairs([
        ("Housekeeping", "ubiquitously expressed maintenance genes"),
        ("Apoptosis", "programmed cell death pathway"),
    ])
    .unwrap();
    let embedded = catalog.embed_all(&ConceptEncoder).unwrap();
    assert_eq!(embedded.get("Housekeeping"), Some(&[0.0; CONCEPT_DIMS][..]));

    let query = vec![1.0, 0.0, 0.0, 0.0];
    let ranking = rank(&query, &embedded, SimilarityMetric::Cosine).unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking.get("Housekeeping"), Some(0.0));
    assert_eq!(ranking.first().unwrap().label, "Apoptosis");
}

#[test]
fn items_from_tsv_flow_through_aggregation() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("summaries.tsv");
    std::fs::write(
        &path,
        "TP53\tregulates apoptosis and DNA damage response\nGENEX\nIL2\tinterleukin signaling\n",
    )
    .unwrap();

    let loaded = load_items(&path).unwrap();
    assert_eq!(
        loaded,
        items(&[
            ("TP53", "regulates apoptosis and DNA damage response"),
            ("GENEX", ""),
            ("IL2", "interleukin signaling"),
        ])
    );

    let catalog = helpers::concept_catalog();
    let embedded = catalog.embed_all(&ConceptEncoder).unwrap();
    let result = aggregate(&loaded, &embedded, &ConceptEncoder, AggregateOptions::default()).unwrap();
    assert!(result.item("GENEX").unwrap().is_empty());
    assert_eq!(
        result.item("IL2").unwrap().first().unwrap().label,
        "Immune Response"
    );
}
