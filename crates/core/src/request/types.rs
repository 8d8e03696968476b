//! Print request domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a print request.
///
/// ```text
/// pending ──approve──> concluded
///    │
///    └────reject────> rejected
/// ```
///
/// Deletion is not a status: it removes the request from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "concluido")]
    Concluded,
    #[serde(alias = "rejeitado")]
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Pending,
        RequestStatus::Concluded,
        RequestStatus::Rejected,
    ];

    /// Stable name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Concluded => "concluded",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Concluded and rejected requests never change status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendente" => Ok(RequestStatus::Pending),
            "concluded" | "concluido" => Ok(RequestStatus::Concluded),
            "rejected" | "rejeitado" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status: {}", other)),
        }
    }
}

/// Kind of printing requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintType {
    #[serde(rename = "bw", alias = "black_and_white")]
    BlackAndWhite,
    #[serde(rename = "color", alias = "colorida")]
    Color,
}

impl PrintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintType::BlackAndWhite => "bw",
            PrintType::Color => "color",
        }
    }
}

impl fmt::Display for PrintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bw" | "black_and_white" => Ok(PrintType::BlackAndWhite),
            "color" | "colorida" => Ok(PrintType::Color),
            other => Err(format!("unknown print type: {}", other)),
        }
    }
}

/// The editable fields of a print request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFields {
    pub document_count: u32,
    pub page_count: u32,
    pub duplex: bool,
    pub staple: bool,
    pub print_type: PrintType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RequestFields {
    /// Check field invariants and normalise the note.
    pub fn validated(mut self) -> Result<Self, String> {
        if self.document_count == 0 {
            return Err("document_count must be greater than zero".to_string());
        }
        if self.page_count == 0 {
            return Err("page_count must be greater than zero".to_string());
        }
        self.note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(self)
    }
}

/// A file attached to a print request. Contents live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub id: String,
    pub request_id: String,
    /// Original client-side filename.
    pub filename: String,
    /// Key of the contents in the blob store.
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

/// File row to attach; the blob must already be stored under `storage_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachedFile {
    pub filename: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// A print request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub fields: RequestFields,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<AttachedFile>,
}

impl PrintRequest {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner == user_id
    }

    pub fn file(&self, file_id: &str) -> Option<&AttachedFile> {
        self.files.iter().find(|f| f.id == file_id)
    }
}
