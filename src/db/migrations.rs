use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Run all pending migrations against a database created by `schema.rs`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS vitrine_migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );",
    )?;

    run_migration(conn, 1, "index_scalar_filter_columns", |c| {
        c.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_products_price ON products(price);
             CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at);
             CREATE INDEX IF NOT EXISTS idx_collections_year ON collections(year);",
        )?;
        Ok(())
    })?;

    Ok(())
}

/// Ids of the migrations recorded as applied, ascending.
pub fn applied(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM vitrine_migrations ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn run_migration<F>(conn: &Connection, id: i64, name: &str, f: F) -> Result<()>
where
    F: FnOnce(&Connection) -> Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM vitrine_migrations WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if already_applied {
        return Ok(());
    }

    f(conn).with_context(|| format!("Migration {id} ({name}) failed"))?;

    conn.execute(
        "INSERT INTO vitrine_migrations (id, name) VALUES (?1, ?2)",
        rusqlite::params![id, name],
    )?;

    info!("Applied migration {id}: {name}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_schema;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(applied(&conn).unwrap(), vec![1]);
    }
}
