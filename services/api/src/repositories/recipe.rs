//! Recipe repository for database operations
//!
//! Writes run in one transaction so a recipe never becomes visible with
//! only part of its tags or ingredients.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::info;

use crate::{
    models::{AttributeKind, NewRecipe, Recipe, RecipeChanges, RecipeFilter},
    repositories::{RecipeRepository, attribute},
};

const RECIPE_COLUMNS: &str = "id, user_id, title, description, time_minutes, price, link, \
                              image, created_at, updated_at";

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    time_minutes: i32,
    price: Decimal,
    link: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// PostgreSQL-backed recipe repository
#[derive(Clone)]
pub struct PgRecipeRepository {
    pool: PgPool,
}

impl PgRecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Resolve `names` for the owner and attach them to the recipe in order
async fn attach_named(
    conn: &mut PgConnection,
    kind: AttributeKind,
    owner: i64,
    recipe_id: i64,
    names: &[String],
) -> DatabaseResult<()> {
    for name in names {
        let attribute_id = attribute::get_or_create(&mut *conn, kind, owner, name).await?;
        attribute::attach(&mut *conn, kind, recipe_id, attribute_id).await?;
    }
    Ok(())
}

/// Turn rows into recipes with their tags and ingredients loaded
async fn materialize(
    conn: &mut PgConnection,
    rows: Vec<RecipeRow>,
) -> DatabaseResult<Vec<Recipe>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut tags = attribute::load_for_recipes(&mut *conn, AttributeKind::Tag, &ids).await?;
    let mut ingredients =
        attribute::load_for_recipes(&mut *conn, AttributeKind::Ingredient, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| Recipe {
            tags: tags.remove(&row.id).unwrap_or_default(),
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn materialize_one(conn: &mut PgConnection, row: RecipeRow) -> DatabaseResult<Recipe> {
    materialize(conn, vec![row])
        .await?
        .pop()
        .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn create(&self, owner: i64, recipe: &NewRecipe) -> DatabaseResult<Recipe> {
        info!("Creating recipe '{}' for user {}", recipe.title, owner);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let sql = format!(
            "INSERT INTO recipes (user_id, title, description, time_minutes, price, link) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner)
            .bind(&recipe.title)
            .bind(&recipe.description)
            .bind(recipe.time_minutes)
            .bind(recipe.price)
            .bind(&recipe.link)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        attach_named(&mut *tx, AttributeKind::Tag, owner, row.id, &recipe.tags).await?;
        attach_named(
            &mut *tx,
            AttributeKind::Ingredient,
            owner,
            row.id,
            &recipe.ingredients,
        )
        .await?;

        let created = materialize_one(&mut *tx, row).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(created)
    }

    async fn update(
        &self,
        owner: i64,
        id: i64,
        changes: &RecipeChanges,
    ) -> DatabaseResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let sql = format!(
            "UPDATE recipes SET \
             title = COALESCE($3, title), \
             description = COALESCE($4, description), \
             time_minutes = COALESCE($5, time_minutes), \
             price = COALESCE($6, price), \
             link = COALESCE($7, link), \
             updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.time_minutes)
            .bind(changes.price)
            .bind(changes.link.as_deref())
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        // dropping the transaction rolls it back
        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(tags) = &changes.tags {
            attribute::clear(&mut *tx, AttributeKind::Tag, row.id).await?;
            attach_named(&mut *tx, AttributeKind::Tag, owner, row.id, tags).await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            attribute::clear(&mut *tx, AttributeKind::Ingredient, row.id).await?;
            attach_named(
                &mut *tx,
                AttributeKind::Ingredient,
                owner,
                row.id,
                ingredients,
            )
            .await?;
        }

        let updated = materialize_one(&mut *tx, row).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        info!("Updated recipe {} for user {}", id, owner);
        Ok(Some(updated))
    }

    async fn find(&self, owner: i64, id: i64) -> DatabaseResult<Option<Recipe>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::Connection)?;

        let sql = format!(
            "SELECT {} FROM recipes WHERE id = $1 AND user_id = $2",
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => Ok(Some(materialize_one(&mut *conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, owner: i64, filter: &RecipeFilter) -> DatabaseResult<Vec<Recipe>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::Connection)?;

        // EXISTS rather than JOIN so a recipe matching several ids appears once
        let sql = format!(
            "SELECT {} FROM recipes r \
             WHERE r.user_id = $1 \
             AND ($2::BIGINT[] IS NULL OR EXISTS \
                 (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2))) \
             AND ($3::BIGINT[] IS NULL OR EXISTS \
                 (SELECT 1 FROM recipe_ingredients ri \
                  WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3))) \
             ORDER BY r.id DESC",
            RECIPE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner)
            .bind(filter.tag_ids.as_deref())
            .bind(filter.ingredient_ids.as_deref())
            .fetch_all(&mut *conn)
            .await
            .map_err(DatabaseError::Query)?;

        materialize(&mut *conn, rows).await
    }

    async fn delete(&self, owner: i64, id: i64) -> DatabaseResult<bool> {
        info!("Deleting recipe {} for user {}", id, owner);

        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> DatabaseResult<Option<Recipe>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::Connection)?;

        let sql = format!(
            "UPDATE recipes SET image = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            RECIPE_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(image)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => Ok(Some(materialize_one(&mut *conn, row).await?)),
            None => Ok(None),
        }
    }
}
