pub mod migrations;
pub mod models;
pub mod predicate;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::Model;
use crate::filters::Where;
use models::*;

pub struct Database {
    pub conn: Connection,
    pub path: PathBuf,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;",
        )?;

        schema::create_schema(&conn)?;
        migrations::run_migrations(&conn)?;

        info!("Opened database: {}", path.display());

        Ok(Database {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Throwaway database, used by tests and `import --dry-run`.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::create_schema(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Database {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Default database path: ~/.vitrine/vitrine.db
    pub fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".vitrine").join("vitrine.db"))
    }

    pub fn upsert_brand(&self, brand: &NamedRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO brands (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            rusqlite::params![brand.id, brand.name],
        )?;
        Ok(())
    }

    pub fn upsert_style(&self, style: &NamedRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO styles (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            rusqlite::params![style.id, style.name],
        )?;
        Ok(())
    }

    /// Insert or update a product and its style links.
    pub fn insert_product(&self, p: &NewProduct) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO products (id, name, description, price, level, brand_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, description = excluded.description, price = excluded.price,
                level = excluded.level, brand_id = excluded.brand_id,
                created_at = excluded.created_at",
            rusqlite::params![
                p.id,
                p.name,
                p.description,
                p.price,
                p.level,
                p.brand,
                p.created_at,
            ],
        )
        .with_context(|| format!("Failed to insert product {}", p.id))?;

        tx.execute("DELETE FROM product_styles WHERE product_id = ?1", [p.id])?;
        for style in &p.styles {
            tx.execute(
                "INSERT OR IGNORE INTO product_styles (product_id, style_id) VALUES (?1, ?2)",
                rusqlite::params![p.id, style],
            )
            .with_context(|| format!("Product {} links unknown style {style}", p.id))?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Insert or update a collection and its product links.
    pub fn insert_collection(&self, c: &NewCollection) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO collections (id, name, year, season, sex, level, brand_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, year = excluded.year, season = excluded.season,
                sex = excluded.sex, level = excluded.level, brand_id = excluded.brand_id",
            rusqlite::params![c.id, c.name, c.year, c.season, c.sex, c.level, c.brand],
        )
        .with_context(|| format!("Failed to insert collection {}", c.id))?;

        tx.execute("DELETE FROM collection_products WHERE collection_id = ?1", [c.id])?;
        for product in &c.products {
            tx.execute(
                "INSERT OR IGNORE INTO collection_products (collection_id, product_id) VALUES (?1, ?2)",
                rusqlite::params![c.id, product],
            )
            .with_context(|| format!("Collection {} links unknown product {product}", c.id))?;
        }

        tx.commit()?;
        Ok(())
    }

    /// One page of `M` records matching `predicate`, in id order.
    ///
    /// `search` narrows the result further by a name match that ignores
    /// whitespace and case. `filtered` counts every match, not just the page.
    pub fn find_many<M: Model>(
        &self,
        predicate: &Where,
        search: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<FindResult<M::Row>> {
        let mut sql_predicate = predicate::to_sql::<M>(predicate);
        let mut clause = sql_predicate.clause.clone();
        if let Some(term) = search {
            sql_predicate
                .params
                .push(Box::new(format!("%{}%", predicate::escape_like(term))));
            clause = format!(
                "{clause} AND replace(t.name, ' ', '') LIKE ?{} ESCAPE '\\'",
                sql_predicate.params.len()
            );
        }
        debug!(model = M::MODEL, %clause, limit, offset, "find_many");

        let filtered: i64 = {
            let sql = format!("SELECT COUNT(*) FROM {} t WHERE {clause}", M::TABLE);
            let param_refs = sql_predicate.param_refs();
            self.conn
                .query_row(&sql, param_refs.as_slice(), |r| r.get(0))
                .with_context(|| format!("Failed to count {} rows", M::MODEL))?
        };
        let total: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", M::TABLE), [], |r| r.get(0))?;

        let sql = format!(
            "SELECT {} FROM {} t WHERE {clause} ORDER BY t.id LIMIT ?{} OFFSET ?{}",
            M::COLUMNS,
            M::TABLE,
            sql_predicate.params.len() + 1,
            sql_predicate.params.len() + 2
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let limit = limit as i64;
        let offset = offset as i64;
        let mut param_refs: Vec<&dyn ToSql> = sql_predicate.param_refs();
        param_refs.push(&limit);
        param_refs.push(&offset);

        let rows = stmt.query_map(param_refs.as_slice(), |row| M::from_row(row))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(FindResult {
            records,
            filtered,
            total,
        })
    }

    /// Get database statistics.
    pub fn stats(&self) -> Result<DbStats> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        };

        let mut stmt = self
            .conn
            .prepare("SELECT level, COUNT(*) FROM products GROUP BY level ORDER BY level")?;
        let level_rows = stmt.query_map([], |row| {
            Ok(LevelCount {
                level: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut levels = Vec::new();
        for row in level_rows {
            levels.push(row?);
        }

        let schema_version: String = self.conn.query_row(
            "SELECT value FROM vitrine_meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )?;

        let db_size_bytes = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(DbStats {
            brands: count("brands")?,
            styles: count("styles")?,
            products: count("products")?,
            collections: count("collections")?,
            levels,
            schema_version,
            migrations: migrations::applied(&self.conn)?,
            db_size_bytes,
        })
    }
}
