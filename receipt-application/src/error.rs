use thiserror::Error;

/// Failure of one pipeline request, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),
    #[error("failed to fetch object: {0:#}")]
    FetchFailed(anyhow::Error),
    #[error("failed to extract receipt: {0}")]
    ExtractionFailed(String),
    #[error("failed to persist receipt: {0:#}")]
    PersistenceFailed(anyhow::Error),
    #[error("{stage} stage did not finish within {seconds}s")]
    TimedOut { stage: &'static str, seconds: u64 },
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            AppError::MalformedEvent(_) => Some("decode"),
            AppError::FetchFailed(_) => Some("fetch"),
            AppError::ExtractionFailed(_) => Some("extract"),
            AppError::PersistenceFailed(_) => Some("persist"),
            AppError::TimedOut { stage, .. } => Some(stage),
            AppError::NotFound(_) | AppError::Internal(_) => None,
        }
    }
}
