use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{admin, audit, handlers, professor, requests};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().storage.max_upload_bytes;

    // Routes that need an authenticated principal
    let protected_routes = Router::new()
        // Submission and owner edits
        .route("/requests", post(requests::create_request))
        .route(
            "/requests/{id}/edit",
            get(requests::edit_form).post(requests::edit_request),
        )
        .route(
            "/requests/{id}/files/{file_id}",
            get(requests::download_file),
        )
        // Admin panel
        .route(
            "/admin/dashboard",
            get(admin::dashboard).post(admin::dashboard_action),
        )
        .route(
            "/admin/requests/{id}",
            get(admin::request_detail).post(admin::request_action),
        )
        // Professor panel
        .route(
            "/professor/dashboard",
            get(professor::dashboard).post(professor::dashboard_action),
        )
        .route("/professor/requests/{id}", get(professor::request_detail))
        // Audit
        .route("/audit", get(audit::query_audit))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
