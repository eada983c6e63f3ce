//! Tags and ingredients
//!
//! Both are per-user named entities attached to recipes, so they share one
//! model and are told apart by [`AttributeKind`].

use serde::{Deserialize, Serialize};

use crate::{error::ApiError, models::UpdateMode, validation};

/// Which kind of recipe attribute a record is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// Table holding the records
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Association table linking records to recipes
    pub fn link_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Foreign key column in the association table
    pub fn link_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag",
            AttributeKind::Ingredient => "ingredient",
        }
    }
}

/// A tag or ingredient as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
}

/// `{"name": ...}` as sent for nested tags/ingredients and for renames.
///
/// Any `id` in the payload is read-only and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributePayload {
    pub name: Option<String>,
}

impl AttributePayload {
    /// The validated name of a nested entry, which is always required
    pub fn into_name(self, field: &str) -> Result<String, ApiError> {
        let name = self
            .name
            .ok_or_else(|| ApiError::Validation(format!("{}: name is required.", field)))?;
        validation::validate_text(field, &name).map_err(ApiError::Validation)?;
        Ok(name)
    }

    /// The validated new name for a rename, if any
    pub fn into_rename(self, mode: UpdateMode) -> Result<Option<String>, ApiError> {
        match (self.name, mode) {
            (None, UpdateMode::Full) => Err(ApiError::Validation(
                "name: This field is required.".to_string(),
            )),
            (None, UpdateMode::Partial) => Ok(None),
            (Some(name), _) => {
                validation::validate_text("name", &name).map_err(ApiError::Validation)?;
                Ok(Some(name))
            }
        }
    }
}

/// Query parameters for tag/ingredient listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeQuery {
    /// `1` restricts the list to entries attached to a recipe
    pub assigned_only: Option<String>,
}

impl AttributeQuery {
    pub fn assigned_only(&self) -> Result<bool, ApiError> {
        validation::parse_flag("assigned_only", self.assigned_only.as_deref())
            .map_err(ApiError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_entry_requires_a_name() {
        let payload = AttributePayload { name: None };
        assert!(payload.into_name("tags").is_err());

        let payload = AttributePayload {
            name: Some("Vegan".to_string()),
        };
        assert_eq!(payload.into_name("tags").unwrap(), "Vegan");
    }

    #[test]
    fn test_rename_modes() {
        let payload = AttributePayload { name: None };
        assert!(payload.clone().into_rename(UpdateMode::Full).is_err());
        assert_eq!(payload.into_rename(UpdateMode::Partial).unwrap(), None);
    }

    #[test]
    fn test_assigned_only_flag() {
        let query = AttributeQuery {
            assigned_only: Some("1".to_string()),
        };
        assert!(query.assigned_only().unwrap());
        assert!(!AttributeQuery::default().assigned_only().unwrap());
    }
}
