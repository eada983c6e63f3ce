//! Registration, token issuance and the authenticated user's profile

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use crate::{
    accounts,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    middleware::AuthUser,
    models::{
        CreateUserRequest, TokenRequest, TokenResponse, UpdateMode, UpdateUserRequest,
        User, UserFields, UserResponse,
    },
    state::AppState,
};

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let fields = UserFields {
        name: payload.name,
        ..UserFields::default()
    };
    let user =
        accounts::create_user(state.users.as_ref(), &payload.email, &payload.password, fields)
            .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange credentials for a bearer token
pub async fn create_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Must include \"email\" and \"password\".".to_string(),
        ));
    }

    let user = accounts::authenticate(state.users.as_ref(), &payload.email, &payload.password)
        .await?;

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Issued token for user {}", user.id);
    Ok(Json(TokenResponse { token }))
}

/// The authenticated user
pub async fn get_me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

pub async fn replace_me(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    apply_update(state, user, payload, UpdateMode::Full).await
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    apply_update(state, user, payload, UpdateMode::Partial).await
}

async fn apply_update(
    state: AppState,
    user: User,
    payload: UpdateUserRequest,
    mode: UpdateMode,
) -> ApiResult<Json<UserResponse>> {
    let changes = payload.into_changes(mode)?;
    let user = accounts::update_user(state.users.as_ref(), user, changes).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Delete the authenticated user and everything they own
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    if !state.users.delete(user.id).await? {
        return Err(ApiError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
