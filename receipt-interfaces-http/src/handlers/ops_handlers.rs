use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use tokio::time::{timeout, Duration};
use tracing::warn;

use receipt_application::AppState;

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

/// Ready when the receipt database answers a ping within `ready_timeout_seconds`.
pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let limit = Duration::from_secs(state.config.ready_timeout_seconds.max(1));
    let failure = match timeout(limit, state.receipt_repo.ping()).await {
        Ok(Ok(())) => return StatusCode::OK,
        Ok(Err(err)) => format!("{:#}", err),
        Err(_) => format!("no answer within {}s", limit.as_secs()),
    };
    warn!("receipt database not ready: {}", failure);
    StatusCode::SERVICE_UNAVAILABLE
}

pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render_prometheus(),
    )
}
