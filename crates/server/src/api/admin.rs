//! Admin panel: dashboard, request detail and status actions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use printdesk_core::{
    ActionOutcome, AdminAction, AdminDashboard, DashboardQuery, PrintRequest, RequestStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::CurrentPrincipal;
use crate::metrics::{REQUESTS_DELETED_TOTAL, REQUEST_STATUS_TRANSITIONS};
use crate::state::AppState;

/// Query parameters shared by both dashboards.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

impl DashboardParams {
    pub fn to_query(&self) -> Result<DashboardQuery, ApiError> {
        Ok(DashboardQuery::from_params(
            self.status.as_deref(),
            self.q.as_deref(),
            self.page.as_deref(),
        )?)
    }
}

/// Action posted from the admin dashboard list.
#[derive(Debug, Deserialize)]
pub struct DashboardActionBody {
    #[serde(alias = "pedido_id")]
    pub request_id: String,
    #[serde(alias = "acao")]
    pub action: AdminAction,
}

/// Action posted from a request detail page.
#[derive(Debug, Deserialize)]
pub struct DetailActionBody {
    #[serde(alias = "acao")]
    pub action: AdminAction,
}

/// Result of a dashboard action.
#[derive(Debug, Serialize)]
pub struct ActionNotice {
    pub message: String,
    pub request_id: String,
    /// Status after the action; absent once deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
}

impl ActionNotice {
    /// Record the outcome in metrics and describe it.
    pub(crate) fn from_outcome(outcome: ActionOutcome, previous: Option<RequestStatus>) -> Self {
        let request = outcome.request();
        let status = match outcome {
            ActionOutcome::StatusChanged(ref request) => {
                if let Some(from) = previous {
                    REQUEST_STATUS_TRANSITIONS
                        .with_label_values(&[from.as_str(), request.status.as_str()])
                        .inc();
                }
                Some(request.status)
            }
            ActionOutcome::Deleted(_) => {
                REQUESTS_DELETED_TOTAL.inc();
                None
            }
        };

        Self {
            message: outcome.message().to_string(),
            request_id: request.id.clone(),
            status,
        }
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(params): Query<DashboardParams>,
) -> Result<Json<AdminDashboard>, ApiError> {
    let query = params.to_query()?;
    let view = state.dashboard().admin_view(&principal, &query).await?;
    Ok(Json(view))
}

/// Approve, reject or delete a request from the dashboard list.
pub async fn dashboard_action(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(body): Json<DashboardActionBody>,
) -> Result<Json<ActionNotice>, ApiError> {
    perform(&state, &principal, &body.request_id, body.action).await
}

pub async fn request_detail(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<PrintRequest>, ApiError> {
    let request = state.workflow().view_as_admin(&principal, &id).await?;
    Ok(Json(request))
}

/// Approve, reject or delete the request shown on its detail page.
pub async fn request_action(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(body): Json<DetailActionBody>,
) -> Result<Json<ActionNotice>, ApiError> {
    perform(&state, &principal, &id, body.action).await
}

async fn perform(
    state: &AppState,
    principal: &printdesk_core::Principal,
    id: &str,
    action: AdminAction,
) -> Result<Json<ActionNotice>, ApiError> {
    let workflow = state.workflow();
    let previous = workflow.view_as_admin(principal, id).await?.status;
    let outcome = workflow.perform_as_admin(principal, id, action).await?;
    Ok(Json(ActionNotice::from_outcome(outcome, Some(previous))))
}
