//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use printdesk_core::{AuthError, AuthRequest, Principal};

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Resolve the caller's [`Principal`] with the configured authenticator.
///
/// On success the principal is stored in the request extensions for
/// [`CurrentPrincipal`]. Missing or wrong credentials end the request
/// with 401; a misconfigured authenticator with 500.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match state.authenticator().authenticate(&auth_request).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(AuthError::NotAuthenticated) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["not_authenticated"]).inc();
            ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required").into_response()
        }
        Err(AuthError::InvalidCredentials(reason)) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["invalid_credentials"]).inc();
            tracing::debug!(%source_ip, "Rejected credentials: {}", reason);
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
        }
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            tracing::error!("Authenticator failure: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Authentication unavailable")
                .into_response()
        }
    }
}

/// Extractor for the authenticated principal.
///
/// Falls back to [`Principal::Anonymous`] when no principal was stored,
/// which only happens on routes outside the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or_else(Principal::anonymous);
        std::future::ready(Ok(CurrentPrincipal(principal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use printdesk_core::config::{ApiKeyEntry, AuthConfig, AuthMethod};
    use printdesk_core::{
        create_audit_system, create_authenticator, load_config_from_str, AuditStore, Authenticator,
        BlobStore, FsBlobStore, RequestStore, Role, SqliteAuditStore, SqliteRequestStore,
    };
    use tower::ServiceExt;

    async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> String {
        match principal.role() {
            Some(role) => format!("{}:{}", principal.display_name(), role.as_str()),
            None => principal.display_name().to_string(),
        }
    }

    fn create_test_state(auth: AuthConfig) -> Arc<AppState> {
        let mut config = load_config_from_str("[auth]\nmethod = \"header\"\n").unwrap();
        config.auth = auth;

        let temp_dir = tempfile::tempdir().unwrap();
        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&config.auth).unwrap());
        let audit_store =
            Arc::new(SqliteAuditStore::in_memory().unwrap()) as Arc<dyn AuditStore>;
        let (audit_handle, _writer) = create_audit_system(audit_store.clone(), 100);
        let request_store =
            Arc::new(SqliteRequestStore::in_memory().unwrap()) as Arc<dyn RequestStore>;
        let blob_store = Arc::new(FsBlobStore::new(temp_dir.path())) as Arc<dyn BlobStore>;

        // Keep the blob directory for the lifetime of the test process
        std::mem::forget(temp_dir);

        Arc::new(AppState::new(
            config,
            authenticator,
            audit_handle,
            audit_store,
            request_store,
            blob_store,
        ))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn api_key_config() -> AuthConfig {
        AuthConfig {
            method: AuthMethod::ApiKey,
            api_keys: vec![ApiKeyEntry {
                key: "secret-key".to_string(),
                user_id: "maria".to_string(),
                role: Role::Admin,
            }],
            ..AuthConfig::header()
        }
    }

    async fn body_text(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_header_auth_resolves_principal() {
        let app = app(create_test_state(AuthConfig::header()));

        let request = Request::builder()
            .uri("/test")
            .header("X-Remote-User", "smith")
            .header("X-Remote-Role", "professor")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "smith:professor");
    }

    #[tokio::test]
    async fn test_header_auth_missing_user() {
        let app = app(create_test_state(AuthConfig::header()));

        let request = Request::builder()
            .uri("/test")
            .header("X-Remote-Role", "admin")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_header_auth_without_role_is_other() {
        let app = app(create_test_state(AuthConfig::header()));

        let request = Request::builder()
            .uri("/test")
            .header("X-Remote-User", "guest")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "guest:other");
    }

    #[tokio::test]
    async fn test_api_key_auth_valid() {
        let app = app(create_test_state(api_key_config()));

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "maria:admin");
    }

    #[tokio::test]
    async fn test_api_key_auth_invalid() {
        let app = app(create_test_state(api_key_config()));

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_x_api_key_header() {
        let app = app(create_test_state(api_key_config()));

        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_principal_extractor_without_middleware() {
        let app: Router = Router::new().route("/test", get(whoami));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }
}
