//! Loading the roll catalog from a JSON file.

use std::path::Path;

use serde::Deserialize;

use rollreq_domain::{LoreOwnership, RollCatalog};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// On-disk catalog: the catalog itself plus lores known by characters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(flatten)]
    catalog: RollCatalog,
    #[serde(default)]
    character_lores: Vec<LoreOwnership>,
}

/// Build a catalog from JSON text. Lores no character owns are dropped.
pub fn parse_catalog(json: &str) -> Result<RollCatalog, serde_json::Error> {
    let file: CatalogFile = serde_json::from_str(json)?;
    let mut catalog = file.catalog;
    for slug in catalog.add_lores(file.character_lores) {
        tracing::warn!(lore = %slug, "Lore has no owning character, leaving it out of the catalog");
    }
    Ok(catalog)
}

pub async fn load_catalog(path: &Path) -> Result<RollCatalog, CatalogError> {
    let shown = path.display().to_string();
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: shown.clone(),
            source,
        })?;
    let catalog = parse_catalog(&json).map_err(|source| CatalogError::Parse {
        path: shown.clone(),
        source,
    })?;
    tracing::info!(
        path = %shown,
        actions = catalog.actions.len(),
        lores = catalog.lores.len(),
        "Roll catalog loaded"
    );
    Ok(catalog)
}
