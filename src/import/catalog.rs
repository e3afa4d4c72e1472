use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Format;
use crate::catalog::collection::{SEASONS, SEXES};
use crate::catalog::LEVELS;
use crate::db::models::{NamedRecord, NewCollection, NewProduct};
use crate::filters::condition::format_instant;

/// One catalog file. Every section is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub brands: Vec<NamedRecord>,
    pub styles: Vec<NamedRecord>,
    pub products: Vec<NewProduct>,
    pub collections: Vec<NewCollection>,
}

impl CatalogFile {
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
            && self.styles.is_empty()
            && self.products.is_empty()
            && self.collections.is_empty()
    }
}

/// Parse and validate a catalog file. Enum columns must hold known variants
/// and product dates are normalised to UTC.
pub fn parse_catalog(content: &str, format: Format) -> Result<CatalogFile> {
    let mut catalog: CatalogFile = match format {
        Format::Json => serde_json::from_str(content).context("Failed to parse JSON catalog")?,
        Format::Yaml => serde_yaml::from_str(content).context("Failed to parse YAML catalog")?,
    };

    for product in &mut catalog.products {
        check_variant("product", product.id, "level", &product.level, LEVELS)?;
        if let Some(raw) = &product.created_at {
            let parsed = DateTime::parse_from_rfc3339(raw).with_context(|| {
                format!("product {}: created_at {raw:?} is not RFC 3339", product.id)
            })?;
            product.created_at = Some(format_instant(&parsed.with_timezone(&Utc)));
        }
    }

    for collection in &catalog.collections {
        check_variant("collection", collection.id, "season", &collection.season, SEASONS)?;
        check_variant("collection", collection.id, "sex", &collection.sex, SEXES)?;
        check_variant("collection", collection.id, "level", &collection.level, LEVELS)?;
    }

    Ok(catalog)
}

fn check_variant(model: &str, id: i64, field: &str, value: &str, variants: &[&str]) -> Result<()> {
    if !variants.contains(&value) {
        bail!(
            "{model} {id}: {field} {value:?} is not one of {}",
            variants.join(", ")
        );
    }
    Ok(())
}
