//! Record file loading.
//!
//! A record file is JSON, either a bare array of item records or a catalog
//! object with `items` and `types` arrays:
//!
//! ```json
//! { "items": [{ "id": "a", "title": "A", "type_id": "t" }],
//!   "types": [{ "id": "t", "title": "Tools" }] }
//! ```

#![allow(clippy::must_use_candidate)]

use anyhow::{Context, Result};
use arbor_core::model::{Record, TypeRecord};
use serde::Deserialize;
use std::path::Path;

/// Items and types read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub items: Vec<Record>,
    pub types: Vec<TypeRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Items(Vec<Record>),
    Catalog {
        #[serde(default)]
        items: Vec<Record>,
        #[serde(default)]
        types: Vec<TypeRecord>,
    },
}

pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let parsed: CatalogFile =
        serde_json::from_str(content).context("expected an array of records or {items, types}")?;
    Ok(match parsed {
        CatalogFile::Items(items) => Catalog {
            items,
            types: Vec::new(),
        },
        CatalogFile::Catalog { items, types } => Catalog { items, types },
    })
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let catalog =
        parse_catalog(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        items = catalog.items.len(),
        types = catalog.types.len(),
        "loaded record file"
    );
    Ok(catalog)
}

/// Types from a standalone file: a bare array, or the `types` of a catalog.
pub fn load_types(path: &Path) -> Result<Vec<TypeRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(types) = serde_json::from_str::<Vec<TypeRecord>>(&content) {
        return Ok(types);
    }
    parse_catalog(&content)
        .map(|catalog| catalog.types)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
