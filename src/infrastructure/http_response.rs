// HTTP response utilities for JSON errors
use crate::application::error::HubError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl HubError {
    pub fn status(&self) -> StatusCode {
        match self {
            HubError::NotFound(_) => StatusCode::NOT_FOUND,
            HubError::Validation(_) => StatusCode::BAD_REQUEST,
            HubError::AnalysisFailed(_) | HubError::ChatFailed(_) | HubError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Upstream and storage causes stay in the logs.
    fn public_message(&self) -> String {
        match self {
            HubError::AnalysisFailed(_) => format!("Error generating analysis: {}", self),
            HubError::Storage(e) => {
                tracing::error!("Storage error: {:#}", e);
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for HubError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected request body");
        HubError::validation(rejection.body_text())
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
