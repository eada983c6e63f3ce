//! Application state shared across handlers

use std::sync::Arc;

use common::storage::ImageStorage;
use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    repositories::{
        AttributeRepository, MemoryStore, PgAttributeRepository, PgRecipeRepository,
        PgUserRepository, RecipeRepository, UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub attributes: Arc<dyn AttributeRepository>,
    pub storage: Arc<dyn ImageStorage>,
    pub jwt_service: JwtService,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn with_postgres(
        pool: PgPool,
        storage: Arc<dyn ImageStorage>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            recipes: Arc::new(PgRecipeRepository::new(pool.clone())),
            attributes: Arc::new(PgAttributeRepository::new(pool)),
            storage,
            jwt_service,
        }
    }

    /// State backed by a fresh in-process store
    pub fn with_memory(storage: Arc<dyn ImageStorage>, jwt_service: JwtService) -> Self {
        let store = MemoryStore::new();

        Self {
            users: Arc::new(store.clone()),
            recipes: Arc::new(store.clone()),
            attributes: Arc::new(store),
            storage,
            jwt_service,
        }
    }
}
