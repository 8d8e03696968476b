use std::collections::HashSet;

use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Dashboard page size is at least 1
/// - Auth settings match the selected method
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.dashboard.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "dashboard.page_size must be at least 1".to_string(),
        ));
    }

    if config.storage.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "storage.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    match config.auth.method {
        AuthMethod::Header => {
            if config.auth.user_header.trim().is_empty() || config.auth.role_header.trim().is_empty()
            {
                return Err(ConfigError::ValidationError(
                    "auth.user_header and auth.role_header must be set".to_string(),
                ));
            }
        }
        AuthMethod::ApiKey => {
            if config.auth.api_keys.is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.api_keys must contain at least one key when method = \"api_key\""
                        .to_string(),
                ));
            }
            let mut seen = HashSet::new();
            for entry in &config.auth.api_keys {
                if entry.key.is_empty() || entry.user_id.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "auth.api_keys entries need a key and a user_id".to_string(),
                    ));
                }
                if !seen.insert(entry.key.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "duplicate api key configured for user {}",
                        entry.user_id
                    )));
                }
            }
        }
    }

    Ok(())
}
