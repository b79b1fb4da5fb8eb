use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use receipt_application::{AppState, Metrics};
use receipt_infrastructure::{
    connect_receipt_repository, AppConfig, S3ObjectFetcher, VisionReceiptExtractor,
};

/// Every long-lived client, built once at start-up.
pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let storage_config = config.to_storage_config();
        let inference_config = config.to_inference_config();

        let receipt_repo = connect_receipt_repository(&config.to_db_config()).await?;
        receipt_repo.ensure_schema().await?;

        info!(
            endpoint = %storage_config.endpoint,
            model = %inference_config.model,
            scratch_dir = %runtime_config.scratch_dir,
            "collaborators configured"
        );
        let fetcher = Arc::new(S3ObjectFetcher::new(&storage_config));
        let extractor = Arc::new(VisionReceiptExtractor::new(inference_config)?);

        let state = AppState {
            config: runtime_config,
            fetcher,
            extractor,
            receipt_repo,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
