use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::auth::Role;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Header carrying the user id when `method = "header"`.
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// Header carrying the role when `method = "header"`.
    #[serde(default = "default_role_header")]
    pub role_header: String,
    /// Static keys when `method = "api_key"`.
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

impl AuthConfig {
    /// Trusted-header auth with the default header names.
    pub fn header() -> Self {
        Self {
            method: AuthMethod::Header,
            user_header: default_user_header(),
            role_header: default_role_header(),
            api_keys: Vec::new(),
        }
    }
}

fn default_user_header() -> String {
    "x-remote-user".to_string()
}

fn default_role_header() -> String {
    "x-remote-role".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Identity is asserted by a trusted reverse proxy through request headers.
    Header,
    /// Identity is looked up from a static API key table.
    ApiKey,
}

/// One API key and the principal it authenticates as.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyEntry {
    pub key: String,
    pub user_id: String,
    pub role: Role,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("printdesk.db")
}

/// Attached file storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding uploaded file contents.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Upper bound for a whole multipart upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Dashboard configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    2
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_header: Option<String>,
    /// Number of configured keys; the keys themselves are never exposed.
    pub api_keys_configured: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let (method, user_header, role_header) = match config.auth.method {
            AuthMethod::Header => (
                "header".to_string(),
                Some(config.auth.user_header.clone()),
                Some(config.auth.role_header.clone()),
            ),
            AuthMethod::ApiKey => ("api_key".to_string(), None, None),
        };

        Self {
            auth: SanitizedAuthConfig {
                method,
                user_header,
                role_header,
                api_keys_configured: config.auth.api_keys.len(),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            dashboard: config.dashboard.clone(),
        }
    }
}
