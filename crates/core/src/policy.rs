//! Access policy: who may do what to which print request.
//!
//! Every check is a pure function of the acting [`Principal`] and, where
//! relevant, the target request. Callers must run these checks before any
//! mutation; the [`Panel`] carried by [`AccessDenied`] only tells a client
//! where to send the user next.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::{Principal, Role};
use crate::request::{PrintRequest, RequestStatus};
use crate::workflow::Action;

/// A dashboard a principal may be sent back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Admin,
    Professor,
}

impl Panel {
    /// API path of the panel.
    pub fn path(&self) -> &'static str {
        match self {
            Panel::Admin => "/api/v1/admin/dashboard",
            Panel::Professor => "/api/v1/professor/dashboard",
        }
    }
}

/// Refusal produced by the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub reason: String,
    /// Panel the principal is allowed to use instead, if any.
    pub redirect_to: Option<Panel>,
}

impl AccessDenied {
    pub fn new(principal: &Principal, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            redirect_to: home_panel(principal),
        }
    }
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for AccessDenied {}

pub fn is_admin(principal: &Principal) -> bool {
    principal.role() == Some(Role::Admin)
}

pub fn is_professor(principal: &Principal) -> bool {
    principal.role() == Some(Role::Professor)
}

fn is_owner(principal: &Principal, request: &PrintRequest) -> bool {
    principal
        .user_id()
        .is_some_and(|user_id| request.is_owned_by(user_id))
}

/// Owner of a pending request.
pub fn can_edit(principal: &Principal, request: &PrintRequest) -> bool {
    is_owner(principal, request) && request.status == RequestStatus::Pending
}

pub fn can_act_on_admin_panel(principal: &Principal) -> bool {
    is_admin(principal)
}

/// Admins see every request; everyone else only their own.
pub fn can_view(principal: &Principal, request: &PrintRequest) -> bool {
    is_admin(principal) || is_owner(principal, request)
}

/// Check that `principal` may perform `action` on `request`.
///
/// Only role and ownership are checked here. Whether the request's status
/// allows the action is decided by [`crate::workflow::transition`].
pub fn authorize(
    principal: &Principal,
    request: &PrintRequest,
    action: Action,
) -> Result<(), AccessDenied> {
    let allowed = match action {
        Action::Approve | Action::Reject => is_admin(principal),
        Action::Delete => is_admin(principal) || is_owner(principal, request),
        Action::Edit => is_owner(principal, request),
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::new(
            principal,
            format!(
                "{} may not {} request {}",
                principal.display_name(),
                action,
                request.id
            ),
        ))
    }
}

/// The dashboard a principal lands on.
pub fn home_panel(principal: &Principal) -> Option<Panel> {
    match principal.role() {
        Some(Role::Admin) => Some(Panel::Admin),
        Some(Role::Professor) => Some(Panel::Professor),
        Some(Role::Other) | None => None,
    }
}
