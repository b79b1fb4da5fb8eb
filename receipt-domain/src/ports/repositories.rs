use async_trait::async_trait;

use crate::entities::{ReceiptExtraction, StoredReceipt};

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    /// Writes the header and its items in one transaction and returns the
    /// generated header id.
    async fn save_receipt(&self, receipt: &ReceiptExtraction) -> anyhow::Result<i64>;
    async fn fetch_receipt(&self, id: i64) -> anyhow::Result<Option<StoredReceipt>>;
    async fn ping(&self) -> anyhow::Result<()>;
}
