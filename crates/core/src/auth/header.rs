//! Trusted-header authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Principal, Role};

/// Authenticator that trusts identity headers set by an upstream proxy.
///
/// The login/session layer lives in front of this service; it forwards the
/// user id and role attribute in two headers. A request without the user
/// header is unauthenticated.
pub struct HeaderAuthenticator {
    user_header: String,
    role_header: String,
}

impl HeaderAuthenticator {
    pub fn new(user_header: impl Into<String>, role_header: impl Into<String>) -> Self {
        Self {
            user_header: user_header.into().to_lowercase(),
            role_header: role_header.into().to_lowercase(),
        }
    }
}

#[async_trait]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Principal, AuthError> {
        let user_id = request
            .headers
            .get(&self.user_header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        let role = request
            .headers
            .get(&self.role_header)
            .map(|v| Role::from_attribute(v))
            .unwrap_or(Role::Other);

        Ok(Principal::user(user_id, role))
    }

    fn method_name(&self) -> &'static str {
        "header"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn make_request(headers: Vec<(&str, &str)>) -> AuthRequest {
        AuthRequest {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: "127.0.0.1".parse::<IpAddr>().unwrap(),
        }
    }

    fn authenticator() -> HeaderAuthenticator {
        HeaderAuthenticator::new("X-Remote-User", "X-Remote-Role")
    }

    #[tokio::test]
    async fn test_professor_headers() {
        let request = make_request(vec![
            ("X-Remote-User", "smith"),
            ("X-Remote-Role", "professor"),
        ]);

        let principal = authenticator().authenticate(&request).await.unwrap();
        assert_eq!(principal, Principal::professor("smith"));
    }

    #[tokio::test]
    async fn test_admin_headers() {
        let request = make_request(vec![("X-Remote-User", "maria"), ("X-Remote-Role", "admin")]);

        let principal = authenticator().authenticate(&request).await.unwrap();
        assert_eq!(principal, Principal::admin("maria"));
    }

    #[tokio::test]
    async fn test_missing_role_is_other() {
        let request = make_request(vec![("X-Remote-User", "joao")]);

        let principal = authenticator().authenticate(&request).await.unwrap();
        assert_eq!(principal.role(), Some(Role::Other));
    }

    #[tokio::test]
    async fn test_missing_user_header() {
        let request = make_request(vec![("X-Remote-Role", "admin")]);

        let result = authenticator().authenticate(&request).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_blank_user_header() {
        let request = make_request(vec![("X-Remote-User", "   ")]);

        let result = authenticator().authenticate(&request).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_method_name() {
        assert_eq!(authenticator().method_name(), "header");
    }
}
