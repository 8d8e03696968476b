//! Request workflow: ties the policy, the state machine and storage together.

use std::sync::Arc;

use crate::audit::{AuditEvent, AuditHandle};
use crate::auth::Principal;
use crate::blob::BlobStore;
use crate::policy::{self, AccessDenied, Panel};
use crate::request::{
    AttachedFile, CreatePrintRequest, NewAttachedFile, PrintRequest, RequestFields, RequestStatus,
    RequestStore, UpdatePrintRequest,
};

use super::error::WorkflowError;
use super::state::{transition, Action, AdminAction, InvalidTransition, Transition};

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Result of a status change or delete.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The request as it is now.
    StatusChanged(PrintRequest),
    /// The request as it was before removal.
    Deleted(PrintRequest),
}

impl ActionOutcome {
    pub fn request(&self) -> &PrintRequest {
        match self {
            ActionOutcome::StatusChanged(request) | ActionOutcome::Deleted(request) => request,
        }
    }

    /// Notice to show the user.
    pub fn message(&self) -> &'static str {
        match self {
            ActionOutcome::StatusChanged(request) => match request.status {
                RequestStatus::Concluded => "Request concluded.",
                RequestStatus::Rejected => "Request rejected.",
                RequestStatus::Pending => "Request updated.",
            },
            ActionOutcome::Deleted(_) => "Request deleted.",
        }
    }
}

/// Contents of an attached file.
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub file: AttachedFile,
    pub data: Vec<u8>,
}

/// Entry point for every operation that reads or changes a single request.
///
/// The acting principal is passed to every call. Access is checked before
/// the state machine, and both before any write.
pub struct RequestWorkflow {
    store: Arc<dyn RequestStore>,
    blobs: Arc<dyn BlobStore>,
    audit: Option<AuditHandle>,
}

impl RequestWorkflow {
    pub fn new(store: Arc<dyn RequestStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            blobs,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Fail unless `principal` may use `panel`.
    pub async fn ensure_panel(
        &self,
        principal: &Principal,
        panel: Panel,
    ) -> Result<(), WorkflowError> {
        let allowed = match panel {
            Panel::Admin => policy::can_act_on_admin_panel(principal),
            Panel::Professor => policy::is_professor(principal),
        };
        if allowed {
            return Ok(());
        }

        let reason = match panel {
            Panel::Admin => "the admin panel is restricted to administrators",
            Panel::Professor => "the professor panel is restricted to professors",
        };
        Err(self
            .deny(principal, panel_action(panel), None, AccessDenied::new(principal, reason))
            .await)
    }

    /// Create a pending request owned by `principal` with the uploaded files.
    pub async fn submit(
        &self,
        principal: &Principal,
        fields: RequestFields,
        uploads: Vec<Upload>,
    ) -> Result<PrintRequest, WorkflowError> {
        let owner = match principal.user_id() {
            Some(user_id) if policy::is_professor(principal) => user_id.to_string(),
            _ => {
                let denied =
                    AccessDenied::new(principal, "only professors may submit print requests");
                return Err(self.deny(principal, "submit", None, denied).await);
            }
        };

        let fields = fields.validated().map_err(WorkflowError::Validation)?;
        let files = self.store_uploads(&uploads).await?;

        let create = CreatePrintRequest {
            owner,
            fields,
            files: files.clone(),
        };
        let request = match self.store.create(create) {
            Ok(request) => request,
            Err(e) => {
                self.remove_blobs(files.iter().map(|f| f.storage_key.as_str()).collect::<Vec<_>>())
                    .await;
                return Err(e.into());
            }
        };

        tracing::info!(
            request_id = %request.id,
            owner = %request.owner,
            files = request.files.len(),
            "Print request submitted"
        );
        self.emit(AuditEvent::RequestSubmitted {
            request_id: request.id.clone(),
            owner: request.owner.clone(),
            document_count: request.fields.document_count,
            page_count: request.fields.page_count,
            file_count: request.files.len(),
        })
        .await;

        Ok(request)
    }

    /// The request, if `principal` may edit it right now.
    pub async fn get_for_edit(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<PrintRequest, WorkflowError> {
        let request = self.store.get(id)?;
        self.guard_edit(principal, &request).await?;
        Ok(request)
    }

    /// Replace the fields of a pending request.
    ///
    /// Non-empty `uploads` replace every attached file; `None` or an empty
    /// list keeps the current files.
    pub async fn edit(
        &self,
        principal: &Principal,
        id: &str,
        fields: RequestFields,
        uploads: Option<Vec<Upload>>,
    ) -> Result<PrintRequest, WorkflowError> {
        let current = self.store.get(id)?;
        self.guard_edit(principal, &current).await?;

        let fields = fields.validated().map_err(WorkflowError::Validation)?;
        let new_files = match uploads {
            Some(uploads) if !uploads.is_empty() => Some(self.store_uploads(&uploads).await?),
            _ => None,
        };

        let update = UpdatePrintRequest {
            fields,
            files: new_files.clone(),
        };
        let outcome = match self.store.update(id, update) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(ref files) = new_files {
                    self.remove_blobs(files.iter().map(|f| f.storage_key.as_str()).collect::<Vec<_>>())
                        .await;
                }
                return Err(e.into());
            }
        };

        self.remove_blobs(outcome.replaced_files.iter().map(|f| f.storage_key.as_str()).collect::<Vec<_>>())
            .await;

        let files_replaced = new_files.is_some();
        tracing::info!(request_id = %id, files_replaced, "Print request edited");
        self.emit(AuditEvent::RequestEdited {
            request_id: id.to_string(),
            edited_by: principal.display_name().to_string(),
            files_replaced,
            file_count: outcome.request.files.len(),
        })
        .await;

        Ok(outcome.request)
    }

    /// Approve, reject or delete a request.
    pub async fn perform(
        &self,
        principal: &Principal,
        id: &str,
        action: Action,
    ) -> Result<ActionOutcome, WorkflowError> {
        let current = self.store.get(id)?;
        if let Err(denied) = policy::authorize(principal, &current, action) {
            return Err(self.deny(principal, action.as_str(), Some(id), denied).await);
        }

        match transition(current.status, action).map_err(|e| invalid_state(id, e))? {
            Transition::To(next) => {
                let updated = self.store.update_status(id, current.status, next)?;

                tracing::info!(
                    request_id = %id,
                    from = %current.status,
                    to = %next,
                    by = %principal.display_name(),
                    "Print request status changed"
                );
                self.emit(AuditEvent::RequestStatusChanged {
                    request_id: id.to_string(),
                    changed_by: principal.display_name().to_string(),
                    from_status: current.status,
                    to_status: next,
                })
                .await;

                Ok(ActionOutcome::StatusChanged(updated))
            }
            Transition::Remove => {
                let deleted = self.store.delete(id)?;
                self.remove_blobs(deleted.files.iter().map(|f| f.storage_key.as_str()).collect::<Vec<_>>())
                    .await;

                tracing::info!(
                    request_id = %id,
                    by = %principal.display_name(),
                    files = deleted.files.len(),
                    "Print request deleted"
                );
                self.emit(AuditEvent::RequestDeleted {
                    request_id: id.to_string(),
                    deleted_by: principal.display_name().to_string(),
                    owner: deleted.owner.clone(),
                    status: deleted.status,
                    file_count: deleted.files.len(),
                })
                .await;

                Ok(ActionOutcome::Deleted(deleted))
            }
            // Field changes go through `edit`
            Transition::Stay => Err(edit_needs_payload()),
        }
    }

    /// An action posted from the admin panel.
    pub async fn perform_as_admin(
        &self,
        principal: &Principal,
        id: &str,
        action: AdminAction,
    ) -> Result<ActionOutcome, WorkflowError> {
        self.ensure_panel(principal, Panel::Admin).await?;
        self.perform(principal, id, action.into()).await
    }

    /// Delete posted from the professor panel. Only the owner's own
    /// requests are visible there, so anything else is not found.
    pub async fn delete_as_owner(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<ActionOutcome, WorkflowError> {
        self.view_as_owner(principal, id).await?;
        self.perform(principal, id, Action::Delete).await
    }

    pub async fn view_as_admin(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<PrintRequest, WorkflowError> {
        self.ensure_panel(principal, Panel::Admin).await?;
        Ok(self.store.get(id)?)
    }

    /// A request owned by `principal`; other owners' requests are not found.
    pub async fn view_as_owner(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<PrintRequest, WorkflowError> {
        self.ensure_panel(principal, Panel::Professor).await?;

        let request = self.store.get(id)?;
        match principal.user_id() {
            Some(user_id) if request.is_owned_by(user_id) => Ok(request),
            _ => Err(WorkflowError::NotFound(id.to_string())),
        }
    }

    /// Read an attached file. Admins and the owner only.
    pub async fn open_file(
        &self,
        principal: &Principal,
        request_id: &str,
        file_id: &str,
    ) -> Result<FileDownload, WorkflowError> {
        let request = self.store.get(request_id)?;
        if !policy::can_view(principal, &request) {
            let denied = AccessDenied::new(principal, "only the owner or an admin may download files");
            return Err(self
                .deny(principal, "download", Some(request_id), denied)
                .await);
        }

        let file = request
            .file(file_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(format!("{}/{}", request_id, file_id)))?;
        let data = self.blobs.get(&file.storage_key).await?;

        Ok(FileDownload { file, data })
    }

    async fn guard_edit(
        &self,
        principal: &Principal,
        request: &PrintRequest,
    ) -> Result<(), WorkflowError> {
        if let Err(denied) = policy::authorize(principal, request, Action::Edit) {
            return Err(self
                .deny(principal, Action::Edit.as_str(), Some(&request.id), denied)
                .await);
        }
        transition(request.status, Action::Edit).map_err(|e| invalid_state(&request.id, e))?;
        Ok(())
    }

    /// Write every upload to the blob store. On failure, blobs already
    /// written by this call are removed.
    async fn store_uploads(&self, uploads: &[Upload]) -> Result<Vec<NewAttachedFile>, WorkflowError> {
        let mut stored: Vec<NewAttachedFile> = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let result = if upload.filename.trim().is_empty() {
                Err(WorkflowError::Validation(
                    "attached files need a filename".to_string(),
                ))
            } else {
                self.blobs
                    .put(&upload.filename, &upload.data)
                    .await
                    .map_err(WorkflowError::from)
            };

            match result {
                Ok(blob) => stored.push(NewAttachedFile {
                    filename: upload.filename.clone(),
                    storage_key: blob.key,
                    content_type: upload.content_type.clone(),
                    size_bytes: blob.size_bytes,
                    sha256: blob.sha256,
                }),
                Err(e) => {
                    self.remove_blobs(stored.iter().map(|f| f.storage_key.as_str()).collect::<Vec<_>>())
                        .await;
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    async fn remove_blobs<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            if let Err(e) = self.blobs.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove blob");
            }
        }
    }

    async fn deny(
        &self,
        principal: &Principal,
        action: &str,
        request_id: Option<&str>,
        denied: AccessDenied,
    ) -> WorkflowError {
        tracing::warn!(
            user = %principal.display_name(),
            action = %action,
            request_id = ?request_id,
            reason = %denied.reason,
            "Access denied"
        );
        self.emit(AuditEvent::AccessDenied {
            user_id: principal.user_id().map(String::from),
            action: action.to_string(),
            request_id: request_id.map(String::from),
            reason: denied.reason.clone(),
        })
        .await;
        WorkflowError::AccessDenied(denied)
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}

fn panel_action(panel: Panel) -> &'static str {
    match panel {
        Panel::Admin => "open_admin_panel",
        Panel::Professor => "open_professor_panel",
    }
}

fn edit_needs_payload() -> WorkflowError {
    WorkflowError::Validation("edit requires new field values".to_string())
}

fn invalid_state(request_id: &str, e: InvalidTransition) -> WorkflowError {
    WorkflowError::InvalidState {
        request_id: request_id.to_string(),
        current_status: e.from,
        operation: e.action.as_str().to_string(),
    }
}
