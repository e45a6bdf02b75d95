//! Seed catalog: the beverages counted on every shift and their nominal
//! full-stock level.
//!
//! The built-in list can be replaced by a `catalog.json` file in the app data
//! directory (an ordered array of `{ "name", "totalStock" }` objects).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const CATALOG_FILE: &str = "catalog.json";

const DEFAULT_CATALOG: &[(&str, u32)] = &[
    ("Água s/ gás", 48),
    ("Água c/ gás", 36),
    ("Coca", 24),
    ("Coca Zero", 24),
    ("H2O", 12),
    ("Mate", 12),
    ("Água Tônica", 6),
    ("Guaraná", 24),
    ("Guaraná Zero", 6),
    ("Fanta Laranja", 6),
    ("Fanta Uva", 6),
    ("Del Valle Manga", 6),
    ("Del Valle Uva", 6),
    ("Del Valle Maracujá", 6),
    ("Del Valle Pêssego", 6),
    ("Colorado", 20),
    ("Budweiser", 20),
    ("Corona", 20),
    ("Stella", 20),
    ("Therezópolis", 18),
    ("Heineken", 12),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(alias = "total_stock", alias = "estoque")]
    pub total_stock: u32,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog entry {index} has an empty name")]
    EmptyName { index: usize },
    #[error("duplicate product in catalog: {0}")]
    DuplicateProduct(String),
}

pub fn default_catalog() -> Vec<CatalogEntry> {
    DEFAULT_CATALOG
        .iter()
        .map(|(name, total_stock)| CatalogEntry {
            name: (*name).to_string(),
            total_stock: *total_stock,
        })
        .collect()
}

/// Trim names and reject empty or repeated ones. Order is kept.
pub fn validate_catalog(entries: Vec<CatalogEntry>) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());
    for (index, mut entry) in entries.into_iter().enumerate() {
        entry.name = entry.name.trim().to_string();
        if entry.name.is_empty() {
            return Err(CatalogError::EmptyName { index });
        }
        if !seen.insert(entry.name.clone()) {
            return Err(CatalogError::DuplicateProduct(entry.name));
        }
        out.push(entry);
    }
    Ok(out)
}

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<CatalogEntry> =
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_catalog(entries)
}

/// Catalog for this session: the override file when present and valid,
/// otherwise the built-in list.
pub fn resolve_catalog(data_dir: &Path) -> Vec<CatalogEntry> {
    let path = data_dir.join(CATALOG_FILE);
    if !path.exists() {
        return default_catalog();
    }
    match load_catalog(&path) {
        Ok(entries) => {
            info!(path = %path.display(), products = entries.len(), "Loaded catalog override");
            entries
        }
        Err(e) => {
            warn!(error = %e, "Catalog override rejected, using built-in catalog");
            default_catalog()
        }
    }
}
