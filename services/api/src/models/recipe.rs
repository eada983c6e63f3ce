//! Recipe models for the API service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    models::{Attribute, AttributePayload, UpdateMode},
    validation,
};

/// A recipe with its tags and ingredients materialized.
///
/// Serializes as the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
    pub description: String,
    /// Storage key of the uploaded image
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// List view of a recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// A validated recipe to create.
///
/// Tag and ingredient names are de-duplicated and keep input order.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Validated changes to an existing recipe.
///
/// `None` leaves the field alone. For `tags`/`ingredients`, `Some` replaces
/// the whole association set, so `Some(vec![])` clears it.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipeChanges {
    /// Copy the supplied scalar fields onto `recipe`
    pub fn apply_scalars(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(description) = &self.description {
            recipe.description = description.clone();
        }
        if let Some(time_minutes) = self.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(link) = &self.link {
            recipe.link = link.clone();
        }
    }
}

/// Request body for creating or updating a recipe.
///
/// The owner is never part of the payload; unknown keys such as `user` are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<AttributePayload>>,
    pub ingredients: Option<Vec<AttributePayload>>,
}

impl RecipePayload {
    /// Validate a payload for recipe creation
    pub fn into_new_recipe(self) -> Result<NewRecipe, ApiError> {
        let changes = self.into_changes(UpdateMode::Full)?;

        Ok(NewRecipe {
            title: changes.title.unwrap_or_default(),
            description: changes.description.unwrap_or_default(),
            time_minutes: changes.time_minutes.unwrap_or_default(),
            price: changes.price.unwrap_or_default(),
            link: changes.link.unwrap_or_default(),
            tags: changes.tags.unwrap_or_default(),
            ingredients: changes.ingredients.unwrap_or_default(),
        })
    }

    /// Validate a payload for an update.
    ///
    /// A full update requires title, time_minutes and price.
    pub fn into_changes(self, mode: UpdateMode) -> Result<RecipeChanges, ApiError> {
        if mode == UpdateMode::Full {
            require("title", self.title.is_some())?;
            require("time_minutes", self.time_minutes.is_some())?;
            require("price", self.price.is_some())?;
        }

        if let Some(title) = &self.title {
            validation::validate_text("title", title).map_err(ApiError::Validation)?;
        }
        if let Some(link) = &self.link {
            validation::validate_optional_text("link", link).map_err(ApiError::Validation)?;
        }
        let price = self
            .price
            .map(validation::validate_price)
            .transpose()
            .map_err(ApiError::Validation)?;

        Ok(RecipeChanges {
            title: self.title,
            description: self.description,
            time_minutes: self.time_minutes,
            price,
            link: self.link,
            tags: self.tags.map(|tags| names("tags", tags)).transpose()?,
            ingredients: self
                .ingredients
                .map(|ingredients| names("ingredients", ingredients))
                .transpose()?,
        })
    }
}

fn require(field: &str, present: bool) -> Result<(), ApiError> {
    if present {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{}: This field is required.",
            field
        )))
    }
}

fn names(field: &str, entries: Vec<AttributePayload>) -> Result<Vec<String>, ApiError> {
    let names = entries
        .into_iter()
        .map(|entry| entry.into_name(field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(validation::dedupe_names(names))
}

/// Query parameters for recipe listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    /// Comma separated tag ids
    pub tags: Option<String>,
    /// Comma separated ingredient ids
    pub ingredients: Option<String>,
}

impl RecipeQuery {
    pub fn into_filter(self) -> Result<RecipeFilter, ApiError> {
        let parse = |field: &str, raw: Option<String>| match raw {
            Some(raw) => validation::parse_id_list(field, &raw).map_err(ApiError::Validation),
            None => Ok(None),
        };

        Ok(RecipeFilter {
            tag_ids: parse("tags", self.tags)?,
            ingredient_ids: parse("ingredients", self.ingredients)?,
        })
    }
}

/// Restrictions applied to a recipe listing.
///
/// A recipe passes a set filter when it carries at least one of the ids;
/// both filters must pass.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

impl RecipeFilter {
    /// Whether a recipe with the given attribute ids passes the filter
    pub fn matches(&self, tag_ids: &[i64], ingredient_ids: &[i64]) -> bool {
        let passes = |wanted: &Option<Vec<i64>>, actual: &[i64]| match wanted {
            Some(wanted) => actual.iter().any(|id| wanted.contains(id)),
            None => true,
        };

        passes(&self.tag_ids, tag_ids) && passes(&self.ingredient_ids, ingredient_ids)
    }
}

/// Response for an image upload
#[derive(Debug, Clone, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

impl From<&Recipe> for RecipeImageResponse {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn tag(name: &str) -> AttributePayload {
        AttributePayload {
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_create_requires_core_fields() {
        let payload = RecipePayload {
            title: Some("Soup".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            payload.into_new_recipe(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_create_defaults_optional_fields() {
        let payload = RecipePayload {
            title: Some("Soup".to_string()),
            time_minutes: Some(30),
            price: Some(Decimal::from_str("5.99").unwrap()),
            ..Default::default()
        };

        let recipe = payload.into_new_recipe().unwrap();
        assert_eq!(recipe.link, "");
        assert_eq!(recipe.description, "");
        assert!(recipe.tags.is_empty());
        assert_eq!(recipe.price.to_string(), "5.99");
    }

    #[test]
    fn test_partial_update_distinguishes_absent_and_empty_tags() {
        let absent = RecipePayload::default()
            .into_changes(UpdateMode::Partial)
            .unwrap();
        assert!(absent.tags.is_none());

        let empty = RecipePayload {
            tags: Some(vec![]),
            ..Default::default()
        }
        .into_changes(UpdateMode::Partial)
        .unwrap();
        assert_eq!(empty.tags, Some(vec![]));
    }

    #[test]
    fn test_duplicate_tag_names_collapse() {
        let changes = RecipePayload {
            tags: Some(vec![tag("Indian"), tag("Breakfast"), tag("Indian")]),
            ..Default::default()
        }
        .into_changes(UpdateMode::Partial)
        .unwrap();

        assert_eq!(
            changes.tags,
            Some(vec!["Indian".to_string(), "Breakfast".to_string()])
        );
    }

    #[test]
    fn test_payload_ignores_owner() {
        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "title": "Soup",
            "user": 42,
        }))
        .unwrap();

        assert_eq!(payload.title.as_deref(), Some("Soup"));
    }

    #[test]
    fn test_query_into_filter() {
        let filter = RecipeQuery {
            tags: Some("1,2".to_string()),
            ingredients: Some(String::new()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.tag_ids, Some(vec![1, 2]));
        assert_eq!(filter.ingredient_ids, None);

        let bad = RecipeQuery {
            tags: Some("x".to_string()),
            ingredients: None,
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn test_filter_matches_any_within_and_all_across() {
        let filter = RecipeFilter {
            tag_ids: Some(vec![1, 2]),
            ingredient_ids: Some(vec![10]),
        };

        assert!(filter.matches(&[2, 5], &[10]));
        assert!(!filter.matches(&[2], &[11]));
        assert!(!filter.matches(&[], &[10]));
        assert!(RecipeFilter::default().matches(&[], &[]));
    }
}
