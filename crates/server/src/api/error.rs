//! Mapping of workflow errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use printdesk_core::WorkflowError;
use serde::Serialize;

use crate::metrics::ACCESS_DENIED_TOTAL;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Panel the caller may use instead, on access denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<&'static str>,
}

/// Error returned by the print request handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                redirect_to: None,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Validation(msg) => Self::bad_request(msg),
            WorkflowError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            WorkflowError::InvalidState { .. } => Self::new(StatusCode::CONFLICT, e.to_string()),
            WorkflowError::AccessDenied(denied) => {
                ACCESS_DENIED_TOTAL.inc();
                Self {
                    status: StatusCode::FORBIDDEN,
                    body: ErrorResponse {
                        error: denied.reason,
                        redirect_to: denied.redirect_to.map(|panel| panel.path()),
                    },
                }
            }
            WorkflowError::Storage(ref msg) => {
                tracing::error!("Storage failure: {}", msg);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
