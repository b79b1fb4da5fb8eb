pub mod postgres_receipts;
pub mod sql_receipts;
pub mod sqlite_receipts;

pub use postgres_receipts::PostgresReceiptRepo;
pub use sql_receipts::SqlReceiptStore;
pub use sqlite_receipts::SqliteReceiptRepo;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use receipt_domain::{DbConfig, ReceiptRepository};

/// Picks the receipt store from the database URL scheme.
pub async fn connect_receipt_repository(config: &DbConfig) -> Result<Arc<dyn ReceiptRepository>> {
    let url = config.database_url.trim();
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        info!("using postgres receipt store");
        let repo = PostgresReceiptRepo::connect(url, config.max_connections).await?;
        return Ok(Arc::new(repo));
    }
    if url.starts_with("sqlite:") {
        info!("using sqlite receipt store");
        let repo = SqliteReceiptRepo::connect(url, config.max_connections).await?;
        return Ok(Arc::new(repo));
    }
    Err(anyhow!("unsupported database url scheme: {}", url))
}
