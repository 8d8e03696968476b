//! Dashboard queries for the admin and professor panels.

use std::sync::Arc;

use serde::Serialize;

use crate::audit::{AuditEvent, AuditHandle};
use crate::auth::Principal;
use crate::policy::{self, AccessDenied};
use crate::request::{PrintRequest, RequestFilter, RequestStatus, RequestStore, Search};
use crate::workflow::WorkflowError;

use super::paginator::{parse_page_number, Page, Paginator};

/// Filters and page requested by a dashboard client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub status: Option<RequestStatus>,
    pub search: Option<String>,
    /// Requested page; clamped into range when served.
    pub page: Option<i64>,
}

impl DashboardQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from raw `status`, `q` and `page` values.
    ///
    /// Empty values mean "no filter". An unknown status is a validation
    /// error; an unparsable page is treated as page 1.
    pub fn from_params(
        status: Option<&str>,
        search: Option<&str>,
        page: Option<&str>,
    ) -> Result<Self, WorkflowError> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<RequestStatus>().map_err(WorkflowError::Validation)?),
            None => None,
        };

        Ok(Self {
            status,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            page: parse_page_number(page),
        })
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }
}

/// Admin panel: every owner's requests plus global totals.
#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub page: Page<PrintRequest>,
    pub status: Option<RequestStatus>,
    pub search: Option<String>,
    pub total_pending: u64,
    pub total_rejected: u64,
    pub total_concluded: u64,
}

/// Professor panel: the professor's own requests plus their totals.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessorDashboard {
    pub page: Page<PrintRequest>,
    pub status: Option<RequestStatus>,
    pub search: Option<String>,
    pub total_all: u64,
    pub total_pending: u64,
    pub total_concluded: u64,
}

pub struct DashboardService {
    store: Arc<dyn RequestStore>,
    paginator: Paginator,
    audit: Option<AuditHandle>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RequestStore>, page_size: u32) -> Self {
        Self {
            store,
            paginator: Paginator::new(page_size),
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.paginator.page_size()
    }

    pub async fn admin_view(
        &self,
        principal: &Principal,
        query: &DashboardQuery,
    ) -> Result<AdminDashboard, WorkflowError> {
        if !policy::can_act_on_admin_panel(principal) {
            return Err(self
                .deny(principal, "open_admin_panel", "the admin panel is restricted to administrators")
                .await);
        }

        let mut filter = RequestFilter::new();
        if let Some(status) = query.status {
            filter = filter.with_status(status);
        }
        if let Some(ref term) = query.search {
            filter = filter.with_search(Search::OwnerOrFilename(term.clone()));
        }

        let page = self.fetch_page(filter, query.page)?;

        // Totals ignore the filters
        Ok(AdminDashboard {
            page,
            status: query.status,
            search: query.search.clone(),
            total_pending: self.count(RequestFilter::new().with_status(RequestStatus::Pending))?,
            total_rejected: self.count(RequestFilter::new().with_status(RequestStatus::Rejected))?,
            total_concluded: self
                .count(RequestFilter::new().with_status(RequestStatus::Concluded))?,
        })
    }

    pub async fn professor_view(
        &self,
        principal: &Principal,
        query: &DashboardQuery,
    ) -> Result<ProfessorDashboard, WorkflowError> {
        let owner = match principal.user_id() {
            Some(user_id) if policy::is_professor(principal) => user_id.to_string(),
            _ => {
                return Err(self
                    .deny(
                        principal,
                        "open_professor_panel",
                        "the professor panel is restricted to professors",
                    )
                    .await)
            }
        };

        let mut filter = RequestFilter::new().with_owner(owner.clone());
        if let Some(status) = query.status {
            filter = filter.with_status(status);
        }
        if let Some(ref term) = query.search {
            filter = filter.with_search(Search::Filename(term.clone()));
        }

        let page = self.fetch_page(filter, query.page)?;

        let own = || RequestFilter::new().with_owner(owner.clone());
        Ok(ProfessorDashboard {
            page,
            status: query.status,
            search: query.search.clone(),
            total_all: self.count(own())?,
            total_pending: self.count(own().with_status(RequestStatus::Pending))?,
            total_concluded: self.count(own().with_status(RequestStatus::Concluded))?,
        })
    }

    fn fetch_page(
        &self,
        filter: RequestFilter,
        requested: Option<i64>,
    ) -> Result<Page<PrintRequest>, WorkflowError> {
        let paginator = self.paginator;
        let window = self.store.list_window(&filter, &|total: i64| {
            let number = paginator.clamp(requested, u64::try_from(total).unwrap_or(0));
            (i64::from(paginator.page_size()), paginator.offset(number))
        })?;

        let total = u64::try_from(window.total).unwrap_or(0);
        let number = paginator.clamp(requested, total);
        Ok(paginator.page(window.items, number, total))
    }

    fn count(&self, filter: RequestFilter) -> Result<u64, WorkflowError> {
        let count = self.store.count(&filter)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn deny(&self, principal: &Principal, action: &str, reason: &str) -> WorkflowError {
        tracing::warn!(user = %principal.display_name(), action = %action, "Access denied");
        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::AccessDenied {
                    user_id: principal.user_id().map(String::from),
                    action: action.to_string(),
                    request_id: None,
                    reason: reason.to_string(),
                })
                .await;
        }
        WorkflowError::AccessDenied(AccessDenied::new(principal, reason))
    }
}
