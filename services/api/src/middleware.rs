//! Authentication middleware for bearer token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::{error::ApiError, models::User, state::AppState};

/// The user a request was authenticated as
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Authentication middleware.
///
/// Resolves the bearer token to an active user and stores it in the request
/// extensions; anything else is `401`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            ApiError::Unauthorized
        })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser(user));

    Ok(next.run(req).await)
}
