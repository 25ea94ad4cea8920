/// Authentication layers for route groups
///
/// `require_login` authenticates the bearer token against a live session and
/// stores the resulting [`AuthContext`] in the request extensions. `require_staff`
/// runs inside it and rejects callers who are not staff.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gradebook_shared::auth::middleware::{authenticate, AuthContext};

/// Requires a valid bearer token backed by a live session
pub async fn require_login(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&state.db, state.jwt_secret(), req.headers()).await?;

    tracing::debug!(user_id = %auth_context.user_id, "Authenticated request");

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Requires the authenticated user to be staff
///
/// Must be layered inside [`require_login`].
pub async fn require_staff(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth_context = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    if !auth_context.is_staff {
        tracing::warn!(user_id = %auth_context.user_id, "Non-staff user denied admin access");
        return Err(ApiError::Forbidden("Staff access required".to_string()));
    }

    Ok(next.run(req).await)
}
