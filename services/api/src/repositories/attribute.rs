//! Tag and ingredient repository for database operations
//!
//! Table names come from [`AttributeKind`], never from user input.

use std::collections::HashMap;

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::{
    models::{Attribute, AttributeKind},
    repositories::{AttributeRepository, duplicate_name},
};

/// PostgreSQL-backed tag and ingredient repository
#[derive(Clone)]
pub struct PgAttributeRepository {
    pool: PgPool,
}

impl PgAttributeRepository {
    /// Create a new attribute repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Return the id of the owner's entry named `name`, creating it if needed
pub(crate) async fn get_or_create(
    conn: &mut PgConnection,
    kind: AttributeKind,
    owner: i64,
    name: &str,
) -> DatabaseResult<i64> {
    // the no-op update makes RETURNING yield the existing row on conflict
    let sql = format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) \
         ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
        kind.table()
    );

    let (id,) = sqlx::query_as::<_, (i64,)>(&sql)
        .bind(owner)
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(DatabaseError::Query)?;

    debug!("Resolved {} '{}' to {}", kind.label(), name, id);
    Ok(id)
}

/// Attach an entry to a recipe; attaching twice is a no-op
pub(crate) async fn attach(
    conn: &mut PgConnection,
    kind: AttributeKind,
    recipe_id: i64,
    attribute_id: i64,
) -> DatabaseResult<()> {
    let sql = format!(
        "INSERT INTO {} (recipe_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.link_table(),
        kind.link_column()
    );

    sqlx::query(&sql)
        .bind(recipe_id)
        .bind(attribute_id)
        .execute(conn)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(())
}

/// Detach every entry of `kind` from a recipe
pub(crate) async fn clear(
    conn: &mut PgConnection,
    kind: AttributeKind,
    recipe_id: i64,
) -> DatabaseResult<()> {
    let sql = format!("DELETE FROM {} WHERE recipe_id = $1", kind.link_table());

    sqlx::query(&sql)
        .bind(recipe_id)
        .execute(conn)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(())
}

/// Load the entries attached to each recipe, in attachment order
pub(crate) async fn load_for_recipes(
    conn: &mut PgConnection,
    kind: AttributeKind,
    recipe_ids: &[i64],
) -> DatabaseResult<HashMap<i64, Vec<Attribute>>> {
    let sql = format!(
        "SELECT l.recipe_id, a.id, a.name FROM {link} l \
         JOIN {table} a ON a.id = l.{column} \
         WHERE l.recipe_id = ANY($1) \
         ORDER BY l.id",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column()
    );

    let rows = sqlx::query_as::<_, (i64, i64, String)>(&sql)
        .bind(recipe_ids)
        .fetch_all(conn)
        .await
        .map_err(DatabaseError::Query)?;

    let mut attached: HashMap<i64, Vec<Attribute>> = HashMap::new();
    for (recipe_id, id, name) in rows {
        attached
            .entry(recipe_id)
            .or_default()
            .push(Attribute { id, name });
    }
    Ok(attached)
}

#[async_trait]
impl AttributeRepository for PgAttributeRepository {
    async fn list(
        &self,
        kind: AttributeKind,
        owner: i64,
        assigned_only: bool,
    ) -> DatabaseResult<Vec<Attribute>> {
        let sql = format!(
            "SELECT a.id, a.name FROM {table} a \
             WHERE a.user_id = $1 \
             AND (NOT $2 OR EXISTS (SELECT 1 FROM {link} l WHERE l.{column} = a.id)) \
             ORDER BY a.name DESC, a.id DESC",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column()
        );

        let rows = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(owner)
            .bind(assigned_only)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Attribute { id, name })
            .collect())
    }

    async fn find(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
    ) -> DatabaseResult<Option<Attribute>> {
        let sql = format!(
            "SELECT id, name FROM {} WHERE id = $1 AND user_id = $2",
            kind.table()
        );

        let row = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.map(|(id, name)| Attribute { id, name }))
    }

    async fn rename(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
        name: &str,
    ) -> DatabaseResult<Option<Attribute>> {
        info!("Renaming {} {} to '{}'", kind.label(), id, name);

        let sql = format!(
            "UPDATE {} SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, name",
            kind.table()
        );

        let row = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(id)
            .bind(owner)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_query(e, &duplicate_name(kind)))?;

        Ok(row.map(|(id, name)| Attribute { id, name }))
    }

    async fn delete(&self, kind: AttributeKind, owner: i64, id: i64) -> DatabaseResult<bool> {
        info!("Deleting {} {}", kind.label(), id);

        // association rows go with it through ON DELETE CASCADE
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", kind.table());

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
