use anyhow::Result;
use rusqlite::Connection;

pub const SCHEMA_VERSION: &str = "1";

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Version tracking
        CREATE TABLE IF NOT EXISTS vitrine_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Related records
        CREATE TABLE IF NOT EXISTS brands (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS styles (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Filterable models
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price REAL,
            level TEXT NOT NULL,
            brand_id INTEGER REFERENCES brands(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS product_styles (
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            style_id INTEGER NOT NULL REFERENCES styles(id) ON DELETE CASCADE,
            PRIMARY KEY (product_id, style_id)
        );

        CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            season TEXT NOT NULL,
            sex TEXT NOT NULL,
            level TEXT NOT NULL,
            brand_id INTEGER REFERENCES brands(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS collection_products (
            collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            PRIMARY KEY (collection_id, product_id)
        );

        -- Indexes for common filters
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);
        CREATE INDEX IF NOT EXISTS idx_products_level ON products(level);
        CREATE INDEX IF NOT EXISTS idx_product_styles_style ON product_styles(style_id);
        CREATE INDEX IF NOT EXISTS idx_collections_brand ON collections(brand_id);
        CREATE INDEX IF NOT EXISTS idx_collection_products_product ON collection_products(product_id);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO vitrine_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}
