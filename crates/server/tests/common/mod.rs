//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router over a
//! temporary database and upload directory. Callers are identified with
//! the trusted `x-remote-user` / `x-remote-role` headers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use printdesk_core::config::{
    AuthConfig, DashboardConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use printdesk_core::{
    create_audit_system, create_authenticator, AuditFilter, AuditStore, Authenticator, BlobStore,
    Config, FsBlobStore, RequestStore, SqliteAuditStore, SqliteRequestStore,
};

/// A caller identity sent through the trusted headers.
#[derive(Debug, Clone, Copy)]
pub struct User {
    pub id: &'static str,
    pub role: &'static str,
}

pub const ADMIN: User = User {
    id: "maria",
    role: "admin",
};

pub const PROFESSOR: User = User {
    id: "smith",
    role: "professor",
};

pub const OTHER_PROFESSOR: User = User {
    id: "jones",
    role: "professor",
};

/// Authenticated, but neither professor nor admin.
pub const STUDENT: User = User {
    id: "pedro",
    role: "student",
};

/// Test fixture for API testing.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Read side of the audit trail
    pub audit_store: Arc<dyn AuditStore>,
    /// Temporary directory for the test database and uploads
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub page_size: u32,
    pub max_upload_bytes: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            page_size: 2,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

impl TestConfig {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }
}

/// A multipart/form-data body.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: "printdesk-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// A complete, valid submission form without files.
pub fn standard_form() -> MultipartForm {
    MultipartForm::new()
        .text("document_count", "2")
        .text("page_count", "10")
        .text("duplex", "on")
        .text("print_type", "bw")
        .text("note", "Room 12")
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let upload_root = temp_dir.path().join("uploads");

        let config = Config {
            auth: AuthConfig::header(),
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            storage: StorageConfig {
                root: upload_root.clone(),
                max_upload_bytes: test_config.max_upload_bytes,
            },
            dashboard: DashboardConfig {
                page_size: test_config.page_size,
            },
        };

        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));
        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let request_store: Arc<dyn RequestStore> = Arc::new(
            SqliteRequestStore::new(&db_path).expect("Failed to create request store"),
        );
        let blob_store: Arc<dyn BlobStore> = Arc::new(
            FsBlobStore::new(upload_root).with_max_bytes(test_config.max_upload_bytes as u64),
        );

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let state = Arc::new(printdesk_server::state::AppState::new(
            config,
            authenticator,
            audit_handle,
            Arc::clone(&audit_store),
            request_store,
            blob_store,
        ));

        let router = printdesk_server::api::create_router(state);

        Self {
            router,
            audit_store,
            temp_dir,
        }
    }

    /// GET without identity headers.
    pub async fn get_anonymous(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, user: User, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("x-remote-user", user.id)
            .header("x-remote-role", user.role)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, user: User, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("x-remote-user", user.id)
            .header("x-remote-role", user.role)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, user: User, path: &str, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("x-remote-user", user.id)
            .header("x-remote-role", user.role)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Submit `form` as `user` and return the new request's id.
    pub async fn submit(&self, user: User, form: MultipartForm) -> String {
        let response = self.post_form(user, "/api/v1/requests", form).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "submit failed: {}",
            response.body
        );
        response.body["request"]["id"]
            .as_str()
            .expect("request id")
            .to_string()
    }

    /// Wait until at least `count` audit events match `filter`.
    pub async fn wait_for_audit(&self, filter: &AuditFilter, count: i64) -> bool {
        for _ in 0..50 {
            if self.audit_store.count(filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
