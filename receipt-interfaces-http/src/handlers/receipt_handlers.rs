use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use receipt_application::commands::receipt_commands;
use receipt_application::queries::receipt_queries;
use receipt_application::AppState;
use receipt_domain::{StorageEventDescriptor, StoredReceipt};

use crate::error::HttpError;

#[derive(Debug, Serialize)]
pub struct EventProcessed {
    pub status: &'static str,
    pub message: String,
    pub receipt_id: i64,
    pub data: StorageEventDescriptor,
}

/// Webhook target for object-created notifications. The body is taken raw so
/// decoding failures surface as stage `decode` instead of an extractor
/// rejection.
pub async fn receive_storage_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EventProcessed>, HttpError> {
    let processed = receipt_commands::process_storage_event(&state, &body).await?;
    Ok(Json(EventProcessed {
        status: "success",
        message: format!("File {} processed successfully", processed.event.object_key),
        receipt_id: processed.receipt_id,
        data: processed.event,
    }))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredReceipt>, HttpError> {
    let receipt = receipt_queries::get_receipt(&state, id).await?;
    Ok(Json(receipt))
}
