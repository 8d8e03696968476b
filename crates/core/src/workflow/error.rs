//! Errors surfaced by workflow and dashboard operations.

use thiserror::Error;

use crate::blob::BlobError;
use crate::policy::AccessDenied;
use crate::request::{RequestError, RequestStatus};

/// Boundary error for every user-facing operation.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("Print request not found: {0}")]
    NotFound(String),

    /// The request's status does not allow the operation.
    #[error("Cannot {operation} print request {request_id}: current status is {current_status}")]
    InvalidState {
        request_id: String,
        current_status: RequestStatus,
        operation: String,
    },

    #[error("Access denied: {0}")]
    AccessDenied(AccessDenied),

    /// Database or blob storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<RequestError> for WorkflowError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Validation(msg) => WorkflowError::Validation(msg),
            RequestError::NotFound(id) => WorkflowError::NotFound(id),
            RequestError::InvalidState {
                request_id,
                current_status,
                operation,
            } => WorkflowError::InvalidState {
                request_id,
                current_status,
                operation,
            },
            RequestError::Database(msg) => WorkflowError::Storage(msg),
        }
    }
}

impl From<BlobError> for WorkflowError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::TooLarge { .. } => WorkflowError::Validation(e.to_string()),
            BlobError::NotFound(_) | BlobError::InvalidKey(_) | BlobError::Io { .. } => {
                WorkflowError::Storage(e.to_string())
            }
        }
    }
}

impl From<AccessDenied> for WorkflowError {
    fn from(e: AccessDenied) -> Self {
        WorkflowError::AccessDenied(e)
    }
}
