use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Role attribute of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Professor,
    Admin,
    /// Authenticated, but neither professor nor admin.
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Professor => "professor",
            Role::Admin => "admin",
            Role::Other => "other",
        }
    }

    /// Parse a role attribute; anything unrecognised is `Other`.
    pub fn from_attribute(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "professor" => Role::Professor,
            "admin" => Role::Admin,
            _ => Role::Other,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting principal, passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Anonymous,
    User { user_id: String, role: Role },
}

impl Principal {
    pub fn anonymous() -> Self {
        Principal::Anonymous
    }

    pub fn professor(user_id: impl Into<String>) -> Self {
        Principal::User {
            user_id: user_id.into(),
            role: Role::Professor,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Principal::User {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn user(user_id: impl Into<String>, role: Role) -> Self {
        Principal::User {
            user_id: user_id.into(),
            role,
        }
    }

    /// User id, or `None` when anonymous.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User { user_id, .. } => Some(user_id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Anonymous => None,
            Principal::User { role, .. } => Some(*role),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User { .. })
    }

    /// Name used in logs and audit records.
    pub fn display_name(&self) -> &str {
        self.user_id().unwrap_or("anonymous")
    }
}
