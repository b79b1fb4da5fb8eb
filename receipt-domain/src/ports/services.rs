use std::path::Path;

use async_trait::async_trait;

use crate::entities::ExtractionOutcome;
use crate::value_objects::ScratchFile;

#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Downloads `bucket/key` into the scratch directory.
    async fn fetch(&self, bucket: &str, key: &str) -> anyhow::Result<ScratchFile>;
}

#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    /// `Err` means the inference call itself failed; a reply that could not
    /// be read as a receipt comes back as `ExtractionOutcome::Failed`.
    async fn extract(&self, image: &Path, content_type: &str) -> anyhow::Result<ExtractionOutcome>;
}
