use serde::{Deserialize, Serialize};

/// A brand or a style: related records referenced by id from filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
}

/// Data needed to insert a product with its style links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    pub level: String,
    #[serde(default)]
    pub brand: Option<i64>,
    #[serde(default)]
    pub styles: Vec<i64>,
    /// RFC 3339; defaults to the insertion time.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Data needed to insert a collection with its product links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub season: String,
    pub sex: String,
    pub level: String,
    #[serde(default)]
    pub brand: Option<i64>,
    #[serde(default)]
    pub products: Vec<i64>,
}

/// Records matched by a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct FindResult<R> {
    pub records: Vec<R>,
    /// Rows matching the predicate, ignoring the page bounds.
    pub filtered: i64,
    /// Rows in the table.
    pub total: i64,
}

/// Stats returned by `vitrine stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub brands: i64,
    pub styles: i64,
    pub products: i64,
    pub collections: i64,
    pub levels: Vec<LevelCount>,
    pub schema_version: String,
    pub migrations: Vec<i64>,
    pub db_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: i64,
}
