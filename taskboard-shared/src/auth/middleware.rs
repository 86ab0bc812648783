/// Bearer-token extraction and the per-request authentication context
///
/// The API layer wraps [`authenticate_bearer`] in an axum middleware: the
/// bearer token is validated and an [`AuthContext`] carrying the verified
/// user id is inserted into request extensions. Handlers never read a
/// client-supplied identity field.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("acting user: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// Authentication context added to request extensions
///
/// Carries only the verified user id; role and approval state are re-read
/// from the database by the authorization checks so permission changes take
/// effect immediately, not at next login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (from the access token's `sub` claim)
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates an auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for bearer-token authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Malformed Authorization header
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

/// Validates the bearer token in a request's headers
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when the Authorization header is absent
/// - [`AuthError::InvalidFormat`] when it is not a Bearer token
/// - [`AuthError::InvalidToken`] when validation fails (bad signature,
///   expired, wrong token type)
pub fn authenticate_bearer(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(AuthContext::from_jwt(claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_authenticate_bearer_valid() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, TokenType::Access), SECRET).unwrap();

        let context = authenticate_bearer(&headers_with_token(&token), SECRET).unwrap();
        assert_eq!(context.user_id, user_id);
    }

    #[test]
    fn test_authenticate_bearer_missing_header() {
        let result = authenticate_bearer(&HeaderMap::new(), SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::MissingCredentials));
    }

    #[test]
    fn test_authenticate_bearer_not_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        let result = authenticate_bearer(&headers, SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidFormat(_)));
    }

    #[test]
    fn test_authenticate_bearer_refresh_token_rejected() {
        let token =
            create_token(&Claims::new(Uuid::new_v4(), TokenType::Refresh), SECRET).unwrap();

        let result = authenticate_bearer(&headers_with_token(&token), SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_authenticate_bearer_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), "other-secret")
            .unwrap();

        let result = authenticate_bearer(&headers_with_token(&token), SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }
}
