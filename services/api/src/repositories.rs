//! Repositories for database operations
//!
//! The traits below are the persistence collaborator. `Pg*` types back them
//! with PostgreSQL; [`MemoryStore`] implements all three in process.

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{
    Attribute, AttributeKind, NewRecipe, NewUser, Recipe, RecipeChanges, RecipeFilter, User,
};

pub mod attribute;
pub mod memory;
pub mod recipe;
pub mod user;

pub use attribute::PgAttributeRepository;
pub use memory::MemoryStore;
pub use recipe::PgRecipeRepository;
pub use user::PgUserRepository;

pub(crate) const DUPLICATE_EMAIL: &str = "user with this email already exists.";

pub(crate) fn duplicate_name(kind: AttributeKind) -> String {
    format!("{} with this name already exists.", kind.label())
}

/// User accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email is a `Conflict`
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Persist every mutable column of `user`
    async fn update(&self, user: &User) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    /// Delete a user together with their recipes, tags and ingredients
    async fn delete(&self, id: i64) -> DatabaseResult<bool>;
}

/// Recipes, always scoped to their owner.
///
/// A recipe owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Insert a recipe and get-or-create-and-attach its tags and ingredients
    async fn create(&self, owner: i64, recipe: &NewRecipe) -> DatabaseResult<Recipe>;

    /// Apply `changes`; supplied tag/ingredient lists replace the current sets
    async fn update(
        &self,
        owner: i64,
        id: i64,
        changes: &RecipeChanges,
    ) -> DatabaseResult<Option<Recipe>>;

    async fn find(&self, owner: i64, id: i64) -> DatabaseResult<Option<Recipe>>;

    /// Owned recipes passing `filter`, newest id first, each once
    async fn list(&self, owner: i64, filter: &RecipeFilter) -> DatabaseResult<Vec<Recipe>>;

    async fn delete(&self, owner: i64, id: i64) -> DatabaseResult<bool>;

    /// Record the storage key of the recipe's image
    async fn set_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> DatabaseResult<Option<Recipe>>;
}

/// Tags and ingredients, scoped to their owner
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// Owned entries by name descending; `assigned_only` keeps those
    /// attached to at least one recipe
    async fn list(
        &self,
        kind: AttributeKind,
        owner: i64,
        assigned_only: bool,
    ) -> DatabaseResult<Vec<Attribute>>;

    async fn find(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
    ) -> DatabaseResult<Option<Attribute>>;

    /// Rename an entry; a name already used by the owner is a `Conflict`
    async fn rename(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
        name: &str,
    ) -> DatabaseResult<Option<Attribute>>;

    /// Delete an entry and detach it from every recipe
    async fn delete(&self, kind: AttributeKind, owner: i64, id: i64) -> DatabaseResult<bool>;
}
