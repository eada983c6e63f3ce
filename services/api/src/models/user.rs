//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::ApiError, models::UpdateMode, validation};

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a user other than the credentials
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_active: true,
            is_staff: true,
        }
    }
}

/// Row to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Validated changes to the authenticated user
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validation::validate_email(&self.email).map_err(ApiError::Validation)?;
        validation::validate_password(&self.password).map_err(ApiError::Validation)?;
        validation::validate_text("name", &self.name).map_err(ApiError::Validation)?;
        Ok(())
    }
}

/// Request to update the authenticated user
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UpdateUserRequest {
    /// Validate the supplied fields; a full update needs all of them
    pub fn into_changes(self, mode: UpdateMode) -> Result<UserChanges, ApiError> {
        if mode == UpdateMode::Full {
            for (field, value) in [
                ("email", &self.email),
                ("password", &self.password),
                ("name", &self.name),
            ] {
                if value.is_none() {
                    return Err(ApiError::Validation(format!(
                        "{}: This field is required.",
                        field
                    )));
                }
            }
        }

        if let Some(email) = &self.email {
            validation::validate_email(email).map_err(ApiError::Validation)?;
        }
        if let Some(password) = &self.password {
            validation::validate_password(password).map_err(ApiError::Validation)?;
        }
        if let Some(name) = &self.name {
            validation::validate_text("name", name).map_err(ApiError::Validation)?;
        }

        Ok(UserChanges {
            email: self.email,
            password: self.password,
            name: self.name,
        })
    }
}

/// User login credentials
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for token generation
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}
