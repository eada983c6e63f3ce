//! In-process implementation of every repository
//!
//! All tables sit behind one lock, so each operation is atomic and a
//! reconciliation never interleaves with another write.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    models::{
        Attribute, AttributeKind, NewRecipe, NewUser, Recipe, RecipeChanges, RecipeFilter, User,
    },
    repositories::{
        AttributeRepository, DUPLICATE_EMAIL, RecipeRepository, UserRepository, duplicate_name,
    },
};

#[derive(Debug, Clone)]
struct StoredRecipe {
    user_id: i64,
    title: String,
    description: String,
    time_minutes: i32,
    price: Decimal,
    link: String,
    image: Option<String>,
    /// Attachment order
    tag_ids: Vec<i64>,
    ingredient_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredRecipe {
    fn attached(&self, kind: AttributeKind) -> &Vec<i64> {
        match kind {
            AttributeKind::Tag => &self.tag_ids,
            AttributeKind::Ingredient => &self.ingredient_ids,
        }
    }

    fn attached_mut(&mut self, kind: AttributeKind) -> &mut Vec<i64> {
        match kind {
            AttributeKind::Tag => &mut self.tag_ids,
            AttributeKind::Ingredient => &mut self.ingredient_ids,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredAttribute {
    user_id: i64,
    name: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    recipes: BTreeMap<i64, StoredRecipe>,
    tags: BTreeMap<i64, StoredAttribute>,
    ingredients: BTreeMap<i64, StoredAttribute>,
    last_user_id: i64,
    last_recipe_id: i64,
    last_tag_id: i64,
    last_ingredient_id: i64,
}

impl Tables {
    fn attributes(&self, kind: AttributeKind) -> &BTreeMap<i64, StoredAttribute> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> &mut BTreeMap<i64, StoredAttribute> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }

    fn next_attribute_id(&mut self, kind: AttributeKind) -> i64 {
        let last = match kind {
            AttributeKind::Tag => &mut self.last_tag_id,
            AttributeKind::Ingredient => &mut self.last_ingredient_id,
        };
        *last += 1;
        *last
    }

    fn get_or_create(&mut self, kind: AttributeKind, owner: i64, name: &str) -> i64 {
        let existing = self
            .attributes(kind)
            .iter()
            .find(|(_, stored)| stored.user_id == owner && stored.name == name)
            .map(|(id, _)| *id);

        if let Some(id) = existing {
            return id;
        }

        let id = self.next_attribute_id(kind);
        self.attributes_mut(kind).insert(
            id,
            StoredAttribute {
                user_id: owner,
                name: name.to_string(),
            },
        );
        id
    }

    /// Resolve `names` for the owner, appending unseen ids to `attached`
    fn attach_named(
        &mut self,
        kind: AttributeKind,
        owner: i64,
        names: &[String],
        attached: &mut Vec<i64>,
    ) {
        for name in names {
            let id = self.get_or_create(kind, owner, name);
            if !attached.contains(&id) {
                attached.push(id);
            }
        }
    }

    fn load(&self, kind: AttributeKind, ids: &[i64]) -> Vec<Attribute> {
        let table = self.attributes(kind);
        ids.iter()
            .filter_map(|id| {
                table.get(id).map(|stored| Attribute {
                    id: *id,
                    name: stored.name.clone(),
                })
            })
            .collect()
    }

    fn materialize(&self, id: i64, stored: &StoredRecipe) -> Recipe {
        Recipe {
            id,
            user_id: stored.user_id,
            title: stored.title.clone(),
            time_minutes: stored.time_minutes,
            price: stored.price,
            link: stored.link.clone(),
            tags: self.load(AttributeKind::Tag, &stored.tag_ids),
            ingredients: self.load(AttributeKind::Ingredient, &stored.ingredient_ids),
            description: stored.description.clone(),
            image: stored.image.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    fn owned_recipe(&self, owner: i64, id: i64) -> Option<&StoredRecipe> {
        self.recipes
            .get(&id)
            .filter(|stored| stored.user_id == owner)
    }

    fn owned_recipe_mut(&mut self, owner: i64, id: i64) -> Option<&mut StoredRecipe> {
        self.recipes
            .get_mut(&id)
            .filter(|stored| stored.user_id == owner)
    }
}

/// Process-local store backing users, recipes, tags and ingredients
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.write();

        if tables.users.values().any(|user| user.email == new_user.email) {
            return Err(DatabaseError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.last_user_id,
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            name: new_user.name.clone(),
            is_active: new_user.is_active,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        info!("Created user {} in memory store", user.id);
        Ok(user)
    }

    async fn update(&self, user: &User) -> DatabaseResult<User> {
        let mut tables = self.tables.write();

        if tables
            .users
            .values()
            .any(|other| other.id != user.id && other.email == user.email)
        {
            return Err(DatabaseError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };

        Ok(stored.clone())
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.write();

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.recipes.retain(|_, recipe| recipe.user_id != id);
        tables.tags.retain(|_, tag| tag.user_id != id);
        tables.ingredients.retain(|_, ingredient| ingredient.user_id != id);

        info!("Deleted user {} and everything they own", id);
        Ok(true)
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn create(&self, owner: i64, recipe: &NewRecipe) -> DatabaseResult<Recipe> {
        let mut tables = self.tables.write();

        let mut tag_ids = Vec::new();
        tables.attach_named(AttributeKind::Tag, owner, &recipe.tags, &mut tag_ids);
        let mut ingredient_ids = Vec::new();
        tables.attach_named(
            AttributeKind::Ingredient,
            owner,
            &recipe.ingredients,
            &mut ingredient_ids,
        );

        tables.last_recipe_id += 1;
        let id = tables.last_recipe_id;
        let now = Utc::now();
        let stored = StoredRecipe {
            user_id: owner,
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            image: None,
            tag_ids,
            ingredient_ids,
            created_at: now,
            updated_at: now,
        };
        let created = tables.materialize(id, &stored);
        tables.recipes.insert(id, stored);

        info!("Created recipe {} for user {}", id, owner);
        Ok(created)
    }

    async fn update(
        &self,
        owner: i64,
        id: i64,
        changes: &RecipeChanges,
    ) -> DatabaseResult<Option<Recipe>> {
        let mut tables = self.tables.write();

        let Some(mut stored) = tables.owned_recipe(owner, id).cloned() else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            stored.title = title.clone();
        }
        if let Some(description) = &changes.description {
            stored.description = description.clone();
        }
        if let Some(time_minutes) = changes.time_minutes {
            stored.time_minutes = time_minutes;
        }
        if let Some(price) = changes.price {
            stored.price = price;
        }
        if let Some(link) = &changes.link {
            stored.link = link.clone();
        }
        for (kind, names) in [
            (AttributeKind::Tag, &changes.tags),
            (AttributeKind::Ingredient, &changes.ingredients),
        ] {
            if let Some(names) = names {
                let mut ids = Vec::new();
                tables.attach_named(kind, owner, names, &mut ids);
                *stored.attached_mut(kind) = ids;
            }
        }
        stored.updated_at = Utc::now();

        let updated = tables.materialize(id, &stored);
        tables.recipes.insert(id, stored);

        Ok(Some(updated))
    }

    async fn find(&self, owner: i64, id: i64) -> DatabaseResult<Option<Recipe>> {
        let tables = self.tables.read();
        Ok(tables
            .owned_recipe(owner, id)
            .map(|stored| tables.materialize(id, stored)))
    }

    async fn list(&self, owner: i64, filter: &RecipeFilter) -> DatabaseResult<Vec<Recipe>> {
        let tables = self.tables.read();
        Ok(tables
            .recipes
            .iter()
            .rev()
            .filter(|(_, stored)| stored.user_id == owner)
            .filter(|(_, stored)| filter.matches(&stored.tag_ids, &stored.ingredient_ids))
            .map(|(id, stored)| tables.materialize(*id, stored))
            .collect())
    }

    async fn delete(&self, owner: i64, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.write();

        if tables.owned_recipe(owner, id).is_none() {
            return Ok(false);
        }
        tables.recipes.remove(&id);

        Ok(true)
    }

    async fn set_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> DatabaseResult<Option<Recipe>> {
        let mut tables = self.tables.write();

        let Some(stored) = tables.owned_recipe_mut(owner, id) else {
            return Ok(None);
        };
        stored.image = Some(image.to_string());
        stored.updated_at = Utc::now();
        let stored = stored.clone();

        Ok(Some(tables.materialize(id, &stored)))
    }
}

#[async_trait]
impl AttributeRepository for MemoryStore {
    async fn list(
        &self,
        kind: AttributeKind,
        owner: i64,
        assigned_only: bool,
    ) -> DatabaseResult<Vec<Attribute>> {
        let tables = self.tables.read();

        let mut attributes: Vec<Attribute> = tables
            .attributes(kind)
            .iter()
            .filter(|(_, stored)| stored.user_id == owner)
            .filter(|(id, _)| {
                !assigned_only
                    || tables
                        .recipes
                        .values()
                        .any(|recipe| recipe.attached(kind).contains(*id))
            })
            .map(|(id, stored)| Attribute {
                id: *id,
                name: stored.name.clone(),
            })
            .collect();
        attributes.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));

        Ok(attributes)
    }

    async fn find(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
    ) -> DatabaseResult<Option<Attribute>> {
        let tables = self.tables.read();
        Ok(tables
            .attributes(kind)
            .get(&id)
            .filter(|stored| stored.user_id == owner)
            .map(|stored| Attribute {
                id,
                name: stored.name.clone(),
            }))
    }

    async fn rename(
        &self,
        kind: AttributeKind,
        owner: i64,
        id: i64,
        name: &str,
    ) -> DatabaseResult<Option<Attribute>> {
        let mut tables = self.tables.write();
        let table = tables.attributes_mut(kind);

        if !table
            .get(&id)
            .is_some_and(|stored| stored.user_id == owner)
        {
            return Ok(None);
        }
        if table
            .iter()
            .any(|(other, stored)| *other != id && stored.user_id == owner && stored.name == name)
        {
            return Err(DatabaseError::Conflict(duplicate_name(kind)));
        }

        let Some(stored) = table.get_mut(&id) else {
            return Ok(None);
        };
        stored.name = name.to_string();

        Ok(Some(Attribute {
            id,
            name: stored.name.clone(),
        }))
    }

    async fn delete(&self, kind: AttributeKind, owner: i64, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.write();

        let owned = tables
            .attributes(kind)
            .get(&id)
            .is_some_and(|stored| stored.user_id == owner);
        if !owned {
            return Ok(false);
        }

        tables.attributes_mut(kind).remove(&id);
        for recipe in tables.recipes.values_mut() {
            recipe.attached_mut(kind).retain(|attached| *attached != id);
        }

        Ok(true)
    }
}
