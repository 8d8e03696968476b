use std::sync::Arc;

use printdesk_core::{
    AuditHandle, AuditStore, Authenticator, BlobStore, Config, DashboardService, RequestStore,
    RequestWorkflow, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit_store: Arc<dyn AuditStore>,
    request_store: Arc<dyn RequestStore>,
    workflow: RequestWorkflow,
    dashboard: DashboardService,
}

impl AppState {
    /// Wire the workflow and dashboard services over the given stores.
    ///
    /// Both services hold a clone of `audit_handle`, so the state must be
    /// dropped before the audit writer can finish.
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit_handle: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        request_store: Arc<dyn RequestStore>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        let workflow = RequestWorkflow::new(Arc::clone(&request_store), blob_store)
            .with_audit(audit_handle.clone());
        let dashboard =
            DashboardService::new(Arc::clone(&request_store), config.dashboard.page_size)
                .with_audit(audit_handle);

        Self {
            config,
            authenticator,
            audit_store,
            request_store,
            workflow,
            dashboard,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn request_store(&self) -> &dyn RequestStore {
        self.request_store.as_ref()
    }

    pub fn workflow(&self) -> &RequestWorkflow {
        &self.workflow
    }

    pub fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }
}
