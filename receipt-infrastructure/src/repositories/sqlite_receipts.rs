use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions};

use super::sql_receipts::SqlReceiptStore;

/// SQLite receipt store, used for local runs and tests.
pub type SqliteReceiptRepo = SqlReceiptStore<Sqlite>;

pub(crate) const SQLITE_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS receipt_headers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    business_name TEXT,
    date TEXT,
    total REAL,
    tax REAL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS receipt_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    header_id INTEGER NOT NULL REFERENCES receipt_headers(id),
    name TEXT,
    price REAL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_receipt_items_header ON receipt_items (header_id)",
];

impl SqlReceiptStore<Sqlite> {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url '{}'", url))?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to :memory: opens its own empty database.
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            max_connections
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .context("failed to open sqlite database")?;
        Ok(Self::new(pool))
    }
}
