/// Request authentication
///
/// [`authenticate`] turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`] by validating the token and loading the live session it
/// names. The API server runs it from its route-group middleware and stores the
/// context in the request extensions, where handlers pick it up by taking an
/// `AuthContext` argument.
///
/// # Example
///
/// ```no_run
/// use gradebook_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("User: {}, staff: {}", auth.user_id, auth.is_staff)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::session::Session;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub is_staff: bool,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// The token's session was ended or has expired
    #[error("Session has ended")]
    SessionEnded,

    /// Authenticated, but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Forbidden(_) => "forbidden",
            AuthError::DatabaseError(_) => "internal_error",
            _ => "unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::DatabaseError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

/// Reads the bearer token out of request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat` for a missing or malformed header
/// - `InvalidToken` when the signature, issuer or expiry check fails
/// - `SessionEnded` when the session was logged out or has expired
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let session = Session::find_active(pool, claims.sid, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::SessionEnded)?;

    Ok(AuthContext {
        user_id: session.user_id,
        session_id: session.session_id,
        is_staff: session.is_staff,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat(_))));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(AuthError::MissingCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::SessionEnded.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Forbidden("Staff access required".to_string()).status(),
            StatusCode::FORBIDDEN
        );

        let response = AuthError::DatabaseError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_context_extractor_requires_extension() {
        let request = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let missing = AuthContext::from_request_parts(&mut parts, &()).await;
        assert!(missing.is_err());

        let context = AuthContext {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            is_staff: false,
        };
        parts.extensions.insert(context);

        let found = AuthContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, context);
    }
}
