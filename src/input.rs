//! Reading `(key, text)` pairs from disk in source order.
//!
//! JSON objects are read with a visitor that keeps every entry, so a key that
//! appears twice reaches the caller twice instead of being collapsed to the
//! last value. Callers decide what a duplicate means for them.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

/// Key/text pairs in the order they appear in the source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderedPairs(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping keys to text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, text)) = map.next_entry::<String, String>()? {
                    pairs.push((key, text));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Parse a JSON object of `{ "key": "text" }` without dropping duplicate keys.
pub fn parse_json_pairs(json: &str) -> Result<Vec<(String, String)>> {
    let pairs: OrderedPairs = serde_json::from_str(json).context("expected a JSON object of strings")?;
    Ok(pairs.0)
}

/// Parse tab-separated `key<TAB>text` lines.
///
/// Blank lines and `#` comments are skipped. A line holding only a key maps
/// that key to empty text.
pub fn parse_tsv_pairs(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('\t') {
            Some((key, text)) => (key.trim().to_string(), text.trim().to_string()),
            None => (line.trim().to_string(), String::new()),
        })
        .collect()
}

/// Read pairs from `path`: JSON for `.json` files, tab-separated otherwise.
pub fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json_pairs(&contents).with_context(|| format!("failed to parse {}", path.display()))
    } else {
        Ok(parse_tsv_pairs(&contents))
    }
}
