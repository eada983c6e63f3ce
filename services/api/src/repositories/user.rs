//! User repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;

use crate::{
    models::{NewUser, User},
    repositories::{DUPLICATE_EMAIL, UserRepository},
};

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.email);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, is_active, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, name, is_active, is_staff, is_superuser,
                      created_at, updated_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(new_user.is_active)
        .bind(new_user.is_staff)
        .bind(new_user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, DUPLICATE_EMAIL))
    }

    async fn update(&self, user: &User) -> DatabaseResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, is_active = $5,
                is_staff = $6, is_superuser = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, name, is_active, is_staff, is_superuser,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, DUPLICATE_EMAIL))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, is_active, is_staff, is_superuser,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, is_active, is_staff, is_superuser,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        info!("Deleting user: {}", id);

        // recipes, tags and ingredients go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
