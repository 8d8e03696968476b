//! Request workflow: the state machine and the operations built on it.

mod error;
mod service;
mod state;

pub use error::WorkflowError;
pub use service::{ActionOutcome, FileDownload, RequestWorkflow, Upload};
pub use state::{transition, Action, AdminAction, InvalidTransition, Transition};
