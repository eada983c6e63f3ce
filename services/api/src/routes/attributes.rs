//! Tag and ingredient endpoints
//!
//! Both resources behave the same; the handlers are generic over an
//! [`AttributeRoute`] marker that picks the kind.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam, QueryParams},
    middleware::AuthUser,
    models::{Attribute, AttributeKind, AttributePayload, AttributeQuery, UpdateMode},
    state::AppState,
};

/// Selects which attribute kind a route serves
pub trait AttributeRoute: Send + Sync + 'static {
    const KIND: AttributeKind;
}

/// `/api/recipe/tags`
pub struct Tags;

impl AttributeRoute for Tags {
    const KIND: AttributeKind = AttributeKind::Tag;
}

/// `/api/recipe/ingredients`
pub struct Ingredients;

impl AttributeRoute for Ingredients {
    const KIND: AttributeKind = AttributeKind::Ingredient;
}

/// List the user's entries by name descending
pub async fn list<R: AttributeRoute>(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    QueryParams(query): QueryParams<AttributeQuery>,
) -> ApiResult<Json<Vec<Attribute>>> {
    let assigned_only = query.assigned_only()?;
    let attributes = state
        .attributes
        .list(R::KIND, user.id, assigned_only)
        .await?;

    Ok(Json(attributes))
}

pub async fn replace<R: AttributeRoute>(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<AttributePayload>,
) -> ApiResult<Json<Attribute>> {
    rename(state, R::KIND, user.id, id, payload, UpdateMode::Full).await
}

pub async fn update<R: AttributeRoute>(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<AttributePayload>,
) -> ApiResult<Json<Attribute>> {
    rename(state, R::KIND, user.id, id, payload, UpdateMode::Partial).await
}

async fn rename(
    state: AppState,
    kind: AttributeKind,
    owner: i64,
    id: i64,
    payload: AttributePayload,
    mode: UpdateMode,
) -> ApiResult<Json<Attribute>> {
    let renamed = match payload.into_rename(mode)? {
        Some(name) => state.attributes.rename(kind, owner, id, &name).await?,
        None => state.attributes.find(kind, owner, id).await?,
    };

    renamed.map(Json).ok_or(ApiError::NotFound)
}

pub async fn delete<R: AttributeRoute>(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !state.attributes.delete(R::KIND, user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
