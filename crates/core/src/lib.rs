pub mod audit;
pub mod auth;
pub mod blob;
pub mod config;
pub mod dashboard;
pub mod policy;
pub mod request;
pub mod workflow;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Principal, Role,
};
pub use blob::{BlobError, BlobStore, FsBlobStore, StoredBlob};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use dashboard::{AdminDashboard, DashboardQuery, DashboardService, Page, ProfessorDashboard};
pub use policy::{AccessDenied, Panel};
pub use request::{
    AttachedFile, PrintRequest, PrintType, RequestError, RequestFields, RequestStatus,
    RequestStore, SqliteRequestStore,
};
pub use workflow::{
    Action, ActionOutcome, AdminAction, FileDownload, RequestWorkflow, Upload, WorkflowError,
};
