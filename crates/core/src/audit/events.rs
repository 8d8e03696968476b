use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RequestStatus;

/// Something worth keeping a permanent record of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },
    RequestSubmitted {
        request_id: String,
        owner: String,
        document_count: u32,
        page_count: u32,
        file_count: usize,
    },
    RequestEdited {
        request_id: String,
        edited_by: String,
        /// True when the attached files were replaced.
        files_replaced: bool,
        file_count: usize,
    },
    RequestStatusChanged {
        request_id: String,
        changed_by: String,
        from_status: RequestStatus,
        to_status: RequestStatus,
    },
    RequestDeleted {
        request_id: String,
        deleted_by: String,
        owner: String,
        /// Status at the time of deletion.
        status: RequestStatus,
        file_count: usize,
    },
    AccessDenied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        reason: String,
    },
}

impl AuditEvent {
    /// Stable name stored in the `event_type` column.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ServiceStarted { .. } => "service_started",
            AuditEvent::ServiceStopped { .. } => "service_stopped",
            AuditEvent::RequestSubmitted { .. } => "request_submitted",
            AuditEvent::RequestEdited { .. } => "request_edited",
            AuditEvent::RequestStatusChanged { .. } => "request_status_changed",
            AuditEvent::RequestDeleted { .. } => "request_deleted",
            AuditEvent::AccessDenied { .. } => "access_denied",
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ServiceStarted { .. } | AuditEvent::ServiceStopped { .. } => None,
            AuditEvent::RequestSubmitted { request_id, .. }
            | AuditEvent::RequestEdited { request_id, .. }
            | AuditEvent::RequestStatusChanged { request_id, .. }
            | AuditEvent::RequestDeleted { request_id, .. } => Some(request_id),
            AuditEvent::AccessDenied { request_id, .. } => request_id.as_deref(),
        }
    }

    /// The user who caused the event.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuditEvent::ServiceStarted { .. } | AuditEvent::ServiceStopped { .. } => None,
            AuditEvent::RequestSubmitted { owner, .. } => Some(owner),
            AuditEvent::RequestEdited { edited_by, .. } => Some(edited_by),
            AuditEvent::RequestStatusChanged { changed_by, .. } => Some(changed_by),
            AuditEvent::RequestDeleted { deleted_by, .. } => Some(deleted_by),
            AuditEvent::AccessDenied { user_id, .. } => user_id.as_deref(),
        }
    }
}

/// A stored audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub request_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}
