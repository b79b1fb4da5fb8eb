use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use receipt_application::AppError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{message}")]
    BadRequest {
        stage: Option<&'static str>,
        message: String,
    },
    #[error("{message}")]
    BadGateway {
        stage: Option<&'static str>,
        message: String,
    },
    #[error("{message}")]
    GatewayTimeout {
        stage: Option<&'static str>,
        message: String,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Internal {
        stage: Option<&'static str>,
        message: String,
    },
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let stage = value.stage();
        let message = value.to_string();
        match value {
            AppError::MalformedEvent(_) => HttpError::BadRequest { stage, message },
            AppError::FetchFailed(_) | AppError::ExtractionFailed(_) => {
                HttpError::BadGateway { stage, message }
            }
            AppError::TimedOut { .. } => HttpError::GatewayTimeout { stage, message },
            AppError::NotFound(_) => HttpError::NotFound(message),
            AppError::PersistenceFailed(_) | AppError::Internal(_) => {
                HttpError::Internal { stage, message }
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<&'static str>,
    error: String,
}

impl HttpError {
    fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            HttpError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.to_string();
        let stage = match self {
            HttpError::BadRequest { stage, .. }
            | HttpError::BadGateway { stage, .. }
            | HttpError::GatewayTimeout { stage, .. }
            | HttpError::Internal { stage, .. } => stage,
            HttpError::NotFound(_) => None,
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), stage = stage.unwrap_or("-"), "request failed: {}", error);
        }
        (
            status,
            Json(ErrorBody {
                status: "error",
                stage,
                error,
            }),
        )
            .into_response()
    }
}
