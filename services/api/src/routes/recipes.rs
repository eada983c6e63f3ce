//! Recipe endpoints, all scoped to the authenticated user

use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam, QueryParams},
    images,
    middleware::AuthUser,
    models::{
        Recipe, RecipeImageResponse, RecipePayload, RecipeQuery, RecipeSummary, UpdateMode,
    },
    state::AppState,
};

/// Multipart field carrying the image
const IMAGE_FIELD: &str = "image";

/// List the user's recipes, optionally filtered by tag or ingredient ids
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    QueryParams(query): QueryParams<RecipeQuery>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let filter = query.into_filter()?;
    let recipes = state.recipes.list(user.id, &filter).await?;

    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> ApiResult<impl IntoResponse> {
    let new_recipe = payload.into_new_recipe()?;
    let recipe = state.recipes.create(user.id, &new_recipe).await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Recipe>> {
    let recipe = state
        .recipes
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

pub async fn replace_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> ApiResult<Json<Recipe>> {
    apply_update(state, user.id, id, payload, UpdateMode::Full).await
}

pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> ApiResult<Json<Recipe>> {
    apply_update(state, user.id, id, payload, UpdateMode::Partial).await
}

async fn apply_update(
    state: AppState,
    owner: i64,
    id: i64,
    payload: RecipePayload,
    mode: UpdateMode,
) -> ApiResult<Json<Recipe>> {
    let changes = payload.into_changes(mode)?;
    let recipe = state
        .recipes
        .update(owner, id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !state.recipes.delete(user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Store an uploaded image and point the recipe at it
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RecipeImageResponse>> {
    let mut multipart = multipart?;
    if state.recipes.find(user.id, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Multipart read error: {}", e);
        ApiError::Validation(format!("Failed to read multipart data: {}", e.body_text()))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            warn!("Field read error: {}", e);
            ApiError::Validation(format!("Failed to read file data: {}", e.body_text()))
        })?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::Validation("image: No file was submitted.".to_string()))?;
    let content_type = images::validate_image(&data).map_err(ApiError::Validation)?;

    let key = images::recipe_image_key(filename.as_deref());
    state
        .storage
        .put(&key, data.to_vec(), Some(content_type))
        .await?;

    // the recipe may have been deleted while the upload was stored
    let Some(recipe) = state.recipes.set_image(user.id, id, &key).await? else {
        if let Err(e) = state.storage.delete(&key).await {
            warn!("Failed to remove orphaned image {}: {}", key, e);
        }
        return Err(ApiError::NotFound);
    };

    info!("Stored image {} for recipe {}", key, id);
    Ok(Json(RecipeImageResponse::from(&recipe)))
}
