// Tags and ingredients: user-owned names attached to recipes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::validation::{check_text, ValidationErrors};

/// Which attribute table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to this attribute
    pub fn link_table(self) -> &'static str {
        match self {
            Self::Tag => "recipe_tags",
            Self::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            Self::Tag => "tag_id",
            Self::Ingredient => "ingredient_id",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub user_id: i64,
}

pub type Tag = Attribute;
pub type Ingredient = Attribute;

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `{ "name": ... }` as posted to the list endpoints or nested in a recipe
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeRequest {
    pub name: Option<String>,
}

impl AttributeRequest {
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors: ValidationErrors = ValidationErrors::new();
        let name: Option<String> = check_text(&mut errors, "name", self.name, true, false);
        match name {
            Some(name) => errors.finish(name),
            None => Err(errors),
        }
    }
}
