//! Loading catalog records from JSON and YAML files.

pub mod catalog;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::db::Database;
use catalog::{parse_catalog, CatalogFile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn detect_from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml" | "yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Record counts of an import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub files: usize,
    pub brands: usize,
    pub styles: usize,
    pub products: usize,
    pub collections: usize,
}

impl ImportSummary {
    fn add(&mut self, catalog: &CatalogFile) {
        self.files += 1;
        self.brands += catalog.brands.len();
        self.styles += catalog.styles.len();
        self.products += catalog.products.len();
        self.collections += catalog.collections.len();
    }
}

/// Import one or more paths (files, directories or glob patterns).
///
/// With `dry_run` every file is parsed and validated but nothing is written.
pub fn import_paths(db: &Database, paths: &[String], dry_run: bool) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_dir() {
            import_directory(db, path, dry_run, &mut summary)?;
        } else if path.is_file() {
            import_file(db, path, dry_run, &mut summary)?;
        } else {
            let matches: Vec<_> = glob::glob(path_str)
                .with_context(|| format!("Invalid path or glob pattern: {path_str}"))?
                .filter_map(|r| r.ok())
                .collect();

            if matches.is_empty() {
                bail!("No files found matching: {path_str}");
            }

            for entry in matches {
                if entry.is_file() {
                    import_file(db, &entry, dry_run, &mut summary)?;
                }
            }
        }
    }

    Ok(summary)
}

fn import_directory(
    db: &Database,
    dir: &Path,
    dry_run: bool,
    summary: &mut ImportSummary,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            import_directory(db, &path, dry_run, summary)?;
        } else if path.is_file() && Format::detect_from_extension(&path).is_some() {
            import_file(db, &path, dry_run, summary)?;
        }
    }

    Ok(())
}

fn import_file(
    db: &Database,
    path: &Path,
    dry_run: bool,
    summary: &mut ImportSummary,
) -> Result<()> {
    let format = Format::detect_from_extension(path)
        .with_context(|| format!("Cannot determine format for: {}", path.display()))?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;

    let catalog = parse_catalog(&content, format)
        .with_context(|| format!("Invalid catalog file: {}", path.display()))?;

    if catalog.is_empty() {
        info!("Nothing to import in {}", path.display());
        return Ok(());
    }

    if dry_run {
        println!(
            "  [dry-run] Would import: {} ({} brands, {} styles, {} products, {} collections)",
            path.display(),
            catalog.brands.len(),
            catalog.styles.len(),
            catalog.products.len(),
            catalog.collections.len()
        );
        summary.add(&catalog);
        return Ok(());
    }

    write_catalog(db, &catalog).with_context(|| format!("Failed to import: {}", path.display()))?;
    info!("Imported: {}", path.display());
    summary.add(&catalog);
    Ok(())
}

/// Write records in dependency order: brands and styles before the records
/// that reference them.
pub fn write_catalog(db: &Database, catalog: &CatalogFile) -> Result<()> {
    for brand in &catalog.brands {
        db.upsert_brand(brand)?;
    }
    for style in &catalog.styles {
        db.upsert_style(style)?;
    }
    for product in &catalog.products {
        db.insert_product(product)?;
    }
    for collection in &catalog.collections {
        db.insert_collection(collection)?;
    }
    Ok(())
}
