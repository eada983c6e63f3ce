//! API service routes

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use crate::{images::MAX_IMAGE_SIZE, middleware::auth_middleware, state::AppState};

pub mod attributes;
pub mod recipes;
pub mod users;

use attributes::{Ingredients, Tags};

/// Room for the multipart framing around the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/user/me",
            get(users::get_me)
                .put(users::replace_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route(
            "/api/recipe/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/api/recipe/recipes/:id",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/api/recipe/recipes/:id/upload-image",
            post(recipes::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route("/api/recipe/tags", get(attributes::list::<Tags>))
        .route(
            "/api/recipe/tags/:id",
            put(attributes::replace::<Tags>)
                .patch(attributes::update::<Tags>)
                .delete(attributes::delete::<Tags>),
        )
        .route("/api/recipe/ingredients", get(attributes::list::<Ingredients>))
        .route(
            "/api/recipe/ingredients/:id",
            put(attributes::replace::<Ingredients>)
                .patch(attributes::update::<Ingredients>)
                .delete(attributes::delete::<Ingredients>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/user/create", post(users::create_user))
        .route("/api/user/token", post(users::create_token))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "recipe-api"
    }))
}
