use std::sync::Arc;

use receipt_domain::ports::{ObjectFetcher, ReceiptExtractor, ReceiptRepository};
use receipt_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub fetcher: Arc<dyn ObjectFetcher>,
    pub extractor: Arc<dyn ReceiptExtractor>,
    pub receipt_repo: Arc<dyn ReceiptRepository>,
    pub metrics: Arc<Metrics>,
}
