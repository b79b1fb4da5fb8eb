use tracing::error;

use crate::{AppError, AppState};
use receipt_domain::StoredReceipt;

pub async fn get_receipt(state: &AppState, id: i64) -> Result<StoredReceipt, AppError> {
    let receipt = state.receipt_repo.fetch_receipt(id).await.map_err(|err| {
        error!("failed to fetch receipt {}: {}", id, err);
        AppError::Internal(err)
    })?;
    receipt.ok_or_else(|| AppError::NotFound(format!("receipt {}", id)))
}
