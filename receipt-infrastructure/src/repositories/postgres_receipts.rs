use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, Postgres};

use super::sql_receipts::SqlReceiptStore;

pub type PostgresReceiptRepo = SqlReceiptStore<Postgres>;

pub(crate) const POSTGRES_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS receipt_headers (
    id BIGSERIAL PRIMARY KEY,
    business_name TEXT,
    date TEXT,
    total DOUBLE PRECISION,
    tax DOUBLE PRECISION
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS receipt_items (
    id BIGSERIAL PRIMARY KEY,
    header_id BIGINT NOT NULL REFERENCES receipt_headers(id),
    name TEXT,
    price DOUBLE PRECISION
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_receipt_items_header ON receipt_items (header_id)",
];

impl SqlReceiptStore<Postgres> {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("failed to connect to postgres")?;
        Ok(Self::new(pool))
    }
}
