//! API models for request and response payloads

pub mod attribute;
pub mod recipe;
pub mod user;

pub use attribute::{Attribute, AttributeKind, AttributePayload, AttributeQuery};
pub use recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeImageResponse, RecipePayload,
    RecipeQuery, RecipeSummary,
};
pub use user::{
    CreateUserRequest, NewUser, TokenRequest, TokenResponse, UpdateUserRequest, User,
    UserChanges, UserFields, UserResponse,
};

/// Whether an update replaces the whole resource (PUT) or only the
/// supplied fields (PATCH)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}
