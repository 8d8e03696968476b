//! Professor panel: the caller's own requests.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use printdesk_core::{AdminAction, Panel, PrintRequest, ProfessorDashboard};
use std::sync::Arc;

use super::admin::{ActionNotice, DashboardActionBody, DashboardParams};
use super::error::ApiError;
use super::middleware::CurrentPrincipal;
use crate::state::AppState;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ProfessorDashboard>, ApiError> {
    let query = params.to_query()?;
    let view = state.dashboard().professor_view(&principal, &query).await?;
    Ok(Json(view))
}

/// Delete one of the caller's requests. Delete is the only action offered
/// on this panel.
pub async fn dashboard_action(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(body): Json<DashboardActionBody>,
) -> Result<Json<ActionNotice>, ApiError> {
    let workflow = state.workflow();
    workflow.ensure_panel(&principal, Panel::Professor).await?;

    if body.action != AdminAction::Delete {
        return Err(ApiError::bad_request(
            "only delete is available from the professor panel",
        ));
    }

    let outcome = workflow.delete_as_owner(&principal, &body.request_id).await?;
    Ok(Json(ActionNotice::from_outcome(outcome, None)))
}

pub async fn request_detail(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<PrintRequest>, ApiError> {
    let request = state.workflow().view_as_owner(&principal, &id).await?;
    Ok(Json(request))
}
