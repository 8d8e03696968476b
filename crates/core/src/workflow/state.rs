//! Print request state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::RequestStatus;

/// Everything that can be done to an existing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Approve,
    Reject,
    Delete,
    Edit,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Delete => "delete",
            Action::Edit => "edit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `acao` value posted from a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    #[serde(alias = "aprovar")]
    Approve,
    #[serde(alias = "rejeitar")]
    Reject,
    #[serde(alias = "excluir")]
    Delete,
}

impl From<AdminAction> for Action {
    fn from(action: AdminAction) -> Self {
        match action {
            AdminAction::Approve => Action::Approve,
            AdminAction::Reject => Action::Reject,
            AdminAction::Delete => Action::Delete,
        }
    }
}

/// Effect of a permitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to a new status.
    To(RequestStatus),
    /// Remove the request entirely.
    Remove,
    /// Keep the status; fields may change.
    Stay,
}

/// An action the current status does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: RequestStatus,
    pub action: Action,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} a {} request", self.action, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

/// Decide what `action` does to a request in status `current`.
///
/// ```text
/// pending  --approve--> concluded
/// pending  --reject---> rejected
/// pending  --edit-----> pending
/// any      --delete---> (removed)
/// ```
pub fn transition(current: RequestStatus, action: Action) -> Result<Transition, InvalidTransition> {
    match (current, action) {
        (_, Action::Delete) => Ok(Transition::Remove),
        (RequestStatus::Pending, Action::Approve) => Ok(Transition::To(RequestStatus::Concluded)),
        (RequestStatus::Pending, Action::Reject) => Ok(Transition::To(RequestStatus::Rejected)),
        (RequestStatus::Pending, Action::Edit) => Ok(Transition::Stay),
        (RequestStatus::Concluded | RequestStatus::Rejected, Action::Approve | Action::Reject | Action::Edit) => {
            Err(InvalidTransition {
                from: current,
                action,
            })
        }
    }
}
