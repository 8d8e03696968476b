//! Request storage trait and types.

use thiserror::Error;

use super::{AttachedFile, NewAttachedFile, PrintRequest, RequestFields, RequestStatus};

/// Error type for request store operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Missing or malformed input.
    #[error("Invalid print request: {0}")]
    Validation(String),

    /// Request not found.
    #[error("Print request not found: {0}")]
    NotFound(String),

    /// Cannot perform operation due to current status.
    #[error("Cannot {operation} print request {request_id}: current status is {current_status}")]
    InvalidState {
        request_id: String,
        current_status: RequestStatus,
        operation: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new print request.
#[derive(Debug, Clone)]
pub struct CreatePrintRequest {
    /// User submitting the request.
    pub owner: String,
    pub fields: RequestFields,
    pub files: Vec<NewAttachedFile>,
}

/// Changes applied by an owner edit.
#[derive(Debug, Clone)]
pub struct UpdatePrintRequest {
    pub fields: RequestFields,
    /// `Some` replaces every attached file; `None` keeps the current ones.
    pub files: Option<Vec<NewAttachedFile>>,
}

/// Outcome of an update.
#[derive(Debug, Clone)]
pub struct RequestUpdate {
    pub request: PrintRequest,
    /// File rows removed by a full replace (empty when files were kept).
    pub replaced_files: Vec<AttachedFile>,
}

/// Case-insensitive substring search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    /// Match the owner id or any attached filename.
    OwnerOrFilename(String),
    /// Match any attached filename.
    Filename(String),
}

impl Search {
    pub fn term(&self) -> &str {
        match self {
            Search::OwnerOrFilename(term) | Search::Filename(term) => term,
        }
    }
}

/// Filter for querying print requests.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    /// Filter by status.
    pub status: Option<RequestStatus>,
    /// Filter by owner.
    pub owner: Option<String>,
    /// Substring search.
    pub search: Option<Search>,
    /// Maximum number of results; `None` returns every match.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            owner: None,
            search: None,
            limit: None,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Blank search terms are ignored.
    pub fn with_search(mut self, search: Search) -> Self {
        if !search.term().trim().is_empty() {
            self.search = Some(search);
        }
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// One window of a filtered listing and the total it was cut from.
#[derive(Debug, Clone)]
pub struct RequestWindow {
    pub total: i64,
    pub items: Vec<PrintRequest>,
}

/// Trait for print request storage backends.
///
/// Every method is one atomic unit: readers never observe a half-applied
/// create, update or delete.
pub trait RequestStore: Send + Sync {
    /// Validate and persist a new pending request with its files.
    fn create(&self, request: CreatePrintRequest) -> Result<PrintRequest, RequestError>;

    /// Get a request by ID.
    fn get(&self, id: &str) -> Result<PrintRequest, RequestError>;

    /// Apply an owner edit. Fails with `InvalidState` unless the request is pending.
    fn update(&self, id: &str, update: UpdatePrintRequest) -> Result<RequestUpdate, RequestError>;

    /// Move a request from `expected` to `next`.
    /// Fails with `InvalidState` if the current status is not `expected`.
    fn update_status(
        &self,
        id: &str,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<PrintRequest, RequestError>;

    /// Permanently delete a request and its file rows.
    /// Returns the deleted request.
    fn delete(&self, id: &str) -> Result<PrintRequest, RequestError>;

    /// List requests matching the filter, newest first.
    fn list(&self, filter: &RequestFilter) -> Result<Vec<PrintRequest>, RequestError>;

    /// Count requests matching the filter (limit and offset are ignored).
    fn count(&self, filter: &RequestFilter) -> Result<i64, RequestError>;

    /// Count the matches and fetch one window of them as a single read.
    ///
    /// `place` maps the total to the `(limit, offset)` to fetch, so the
    /// window is always chosen against the count it is served with.
    fn list_window(
        &self,
        filter: &RequestFilter,
        place: &dyn Fn(i64) -> (i64, i64),
    ) -> Result<RequestWindow, RequestError>;
}
