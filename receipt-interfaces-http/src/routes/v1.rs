use axum::routing::{get, post};
use axum::Router;

use receipt_application::AppState;

use crate::handlers::{ops_handlers, receipt_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/minio/receipt/event",
            post(receipt_handlers::receive_storage_event),
        )
        .route("/receipts/:id", get(receipt_handlers::get_receipt))
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
