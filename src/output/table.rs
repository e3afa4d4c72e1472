use unicode_width::UnicodeWidthStr;

use crate::catalog::collection::CollectionRow;
use crate::catalog::product::ProductRow;
use crate::db::models::{DbStats, FindResult};
use crate::filters::display::FilterLabels;
use crate::filters::{FieldKind, Join, RejectedFilter, Schema};
use crate::import::ImportSummary;

/// Rows that know how to lay themselves out in a listing.
pub trait TableRow {
    fn header() -> String;
    fn line(&self) -> String;
}

impl TableRow for ProductRow {
    fn header() -> String {
        format!(
            "  {:<6} {:<34} {:>10} {:<10} {:<20} {:<10}",
            "ID", "NAME", "PRICE", "LEVEL", "BRAND", "CREATED"
        )
    }

    fn line(&self) -> String {
        let created = self.created_at.get(..10).unwrap_or(&self.created_at);
        format!(
            "  {:<6} {} {:>10} {:<10} {} {:<10}",
            self.id,
            pad(&truncate(&self.name, 34), 34),
            format_price(self.price),
            self.level,
            pad(&truncate(self.brand.as_deref().unwrap_or("-"), 20), 20),
            created,
        )
    }
}

impl TableRow for CollectionRow {
    fn header() -> String {
        format!(
            "  {:<6} {:<30} {:<6} {:<9} {:<7} {:<10} {:<20} {:>8}",
            "ID", "NAME", "YEAR", "SEASON", "SEX", "LEVEL", "BRAND", "PRODUCTS"
        )
    }

    fn line(&self) -> String {
        format!(
            "  {:<6} {} {:<6} {:<9} {:<7} {:<10} {} {:>8}",
            self.id,
            pad(&truncate(&self.name, 30), 30),
            self.year,
            self.season,
            self.sex,
            self.level,
            pad(&truncate(self.brand.as_deref().unwrap_or("-"), 20), 20),
            self.products,
        )
    }
}

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Pad to a display width; `format!` pads by chars, not columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.fract() == 0.0 => format!("{p:.0}"),
        Some(p) => format!("{p:.2}"),
        None => "-".to_string(),
    }
}

/// Print a filtered listing with its counts.
pub fn print_records<R: TableRow>(
    result: &FindResult<R>,
    skip: usize,
    model: &str,
    query_text: &str,
) {
    if result.records.is_empty() {
        if result.filtered > 0 {
            println!("No {model} records past {skip} ({} match)", result.filtered);
        } else if query_text.is_empty() {
            println!("No {model} records.");
        } else {
            println!("No {model} records match {query_text}");
        }
        return;
    }

    println!(
        "{} of {} {model} record{} (showing {}){}:\n",
        result.filtered,
        result.total,
        if result.total == 1 { "" } else { "s" },
        showing(skip, result.records.len()),
        if query_text.is_empty() {
            String::new()
        } else {
            format!(" where {query_text}")
        }
    );

    println!("{}", R::header());
    println!("  {}", "-".repeat(UnicodeWidthStr::width(R::header().trim())));
    for r in &result.records {
        println!("{}", r.line());
    }
}

/// 1-based range of the rows on screen.
fn showing(skip: usize, shown: usize) -> String {
    if skip == 0 {
        shown.to_string()
    } else {
        format!("{}-{}", skip + 1, skip + shown)
    }
}

/// Print filter chips: one line per filter plus the join phrase.
pub fn print_labels(labels: &[FilterLabels], join: Join) {
    if labels.is_empty() {
        return;
    }
    println!("Matching {}:", join.describe());
    for l in labels {
        println!("  [{}] {} {} {}", l.id, l.name, l.condition, truncate(&l.value, 60));
    }
    println!();
}

/// Report tokens dropped while decoding.
pub fn print_rejected(rejected: &[RejectedFilter]) {
    for r in rejected {
        eprintln!("  skipped {r}");
    }
}

/// List the filterable fields of a schema.
pub fn print_fields<S: Schema>() {
    println!("Filterable {} fields:\n", S::MODEL);
    println!("  {:<14} {:<9} CONDITIONS", "FIELD", "KIND");
    println!("  {}", "-".repeat(60));
    for (name, kind) in S::fields() {
        println!("  {:<14} {:<9} {}", name, kind, conditions_of(kind));
    }
}

fn conditions_of(kind: FieldKind) -> String {
    kind.conditions().join(" ")
}

pub fn print_import_summary(summary: &ImportSummary, dry_run: bool) {
    let verb = if dry_run { "Would import" } else { "Imported" };
    println!(
        "{verb} {} file{}: {} brands, {} styles, {} products, {} collections",
        summary.files,
        if summary.files == 1 { "" } else { "s" },
        summary.brands,
        summary.styles,
        summary.products,
        summary.collections
    );
}

/// Print database stats.
pub fn print_stats(stats: &DbStats) {
    println!("Database Statistics:");
    println!("  Brands:      {}", stats.brands);
    println!("  Styles:      {}", stats.styles);
    println!("  Products:    {}", stats.products);
    println!("  Collections: {}", stats.collections);
    println!("  Schema:      v{} ({} migrations)", stats.schema_version, stats.migrations.len());
    println!("  DB Size:     {}", format_bytes(stats.db_size_bytes));
    if !stats.levels.is_empty() {
        println!("\n  Products by level:");
        for lc in &stats.levels {
            println!("    {:<12} {}", lc.level, lc.count);
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
