// Recipes, their request payloads and the list/detail/image response shapes

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::attribute::{AttributeRequest, Ingredient, Tag};
use crate::models::price::Price;
use crate::models::validation::{check_text, ValidationErrors, REQUIRED};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub description: String,
    /// Path relative to the media root, e.g. `uploads/recipe/<uuid>.jpg`
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Everything needed to insert a recipe; attribute names are already resolved to ids
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub description: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Field-wise update. `None` leaves a field unchanged; a present id list replaces the set.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

/// Restricts a recipe listing to recipes carrying any of the given ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let tags_ok: bool = self.tag_ids.is_empty()
            || recipe.tags.iter().any(|tag: &Tag| self.tag_ids.contains(&tag.id));
        let ingredients_ok: bool = self.ingredient_ids.is_empty()
            || recipe
                .ingredients
                .iter()
                .any(|ingredient: &Ingredient| self.ingredient_ids.contains(&ingredient.id));

        tags_ok && ingredients_ok
    }
}

/// Raw JSON body for create / update. Unknown keys such as `user` are ignored.
/// Numeric fields stay raw so bad values surface as field errors.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<Value>,
    pub price: Option<Value>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<AttributeRequest>>,
    pub ingredients: Option<Vec<AttributeRequest>>,
}

/// Validated recipe fields, with nested attributes still expressed by name
#[derive(Debug, Default)]
pub struct RecipeFields {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tag_names: Option<Vec<String>>,
    pub ingredient_names: Option<Vec<String>>,
}

fn check_names(
    errors: &mut ValidationErrors,
    field: &str,
    items: Option<Vec<AttributeRequest>>,
) -> Option<Vec<String>> {
    let items: Vec<AttributeRequest> = items?;
    let mut names: Vec<String> = Vec::with_capacity(items.len());

    for item in items {
        match item.validate() {
            Ok(name) => {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Err(nested) => {
                for message in nested.get("name").unwrap_or_default() {
                    errors.add(field, format!("name: {message}"));
                }
            }
        }
    }

    Some(names)
}

const INVALID_INTEGER: &str = "A valid integer is required.";

/// Accepts integers and integer strings such as `"30"`
fn check_minutes(errors: &mut ValidationErrors, value: Option<Value>, required: bool) -> Option<i32> {
    let Some(value) = value else {
        if required {
            errors.add("time_minutes", REQUIRED);
        }
        return None;
    };

    let minutes: Option<i64> = match &value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v: &f64| v.fract() == 0.0 && v.abs() < 1e18).map(|v: f64| v as i64)),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    };

    match minutes {
        None => {
            errors.add("time_minutes", INVALID_INTEGER);
            None
        }
        Some(minutes) if minutes < 0 => {
            errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
            None
        }
        Some(minutes) => match i32::try_from(minutes) {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                errors.add("time_minutes", "Ensure this value is less than or equal to 2147483647.");
                None
            }
        },
    }
}

fn check_price(errors: &mut ValidationErrors, value: Option<Value>, required: bool) -> Option<Price> {
    let Some(value) = value else {
        if required {
            errors.add("price", REQUIRED);
        }
        return None;
    };

    match Price::from_json(&value) {
        Ok(price) => Some(price),
        Err(e) => {
            errors.add("price", e.to_string());
            None
        }
    }
}

impl RecipeRequest {
    /// `partial` is true for PATCH; otherwise title, time_minutes and price must be present.
    pub fn validate(self, partial: bool) -> Result<RecipeFields, ValidationErrors> {
        let mut errors: ValidationErrors = ValidationErrors::new();
        let required: bool = !partial;

        let title: Option<String> = check_text(&mut errors, "title", self.title, required, false);

        let time_minutes: Option<i32> = check_minutes(&mut errors, self.time_minutes, required);
        let price: Option<Price> = check_price(&mut errors, self.price, required);

        let link: Option<String> = check_text(&mut errors, "link", self.link, false, true);
        let description: Option<String> = self.description.map(|text: String| text.trim().to_owned());
        let tag_names: Option<Vec<String>> = check_names(&mut errors, "tags", self.tags);
        let ingredient_names: Option<Vec<String>> = check_names(&mut errors, "ingredients", self.ingredients);

        errors.finish(RecipeFields {
            title,
            time_minutes,
            price,
            link,
            description,
            tag_names,
            ingredient_names,
        })
    }
}

/// List shape: everything except description and image
#[derive(Debug, Serialize)]
pub struct RecipeSummary<'a> {
    pub id: i64,
    pub title: &'a str,
    pub time_minutes: i32,
    pub price: Price,
    pub link: &'a str,
    pub ingredients: &'a [Ingredient],
    pub tags: &'a [Tag],
}

impl<'a> From<&'a Recipe> for RecipeSummary<'a> {
    fn from(recipe: &'a Recipe) -> Self {
        Self {
            id: recipe.id,
            title: &recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: &recipe.link,
            ingredients: &recipe.ingredients,
            tags: &recipe.tags,
        }
    }
}

/// Detail shape: the list shape plus the description
#[derive(Debug, Serialize)]
pub struct RecipeDetail<'a> {
    #[serde(flatten)]
    pub summary: RecipeSummary<'a>,
    pub description: &'a str,
}

impl<'a> From<&'a Recipe> for RecipeDetail<'a> {
    fn from(recipe: &'a Recipe) -> Self {
        Self {
            summary: RecipeSummary::from(recipe),
            description: &recipe.description,
        }
    }
}

/// Image upload response: the recipe id and the public URL of its image
#[derive(Debug, Serialize)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

impl RecipeImage {
    pub fn new(recipe: &Recipe, media_url: &str) -> Self {
        Self {
            id: recipe.id,
            image: recipe
                .image
                .as_deref()
                .map(|path: &str| format!("{}/{}", media_url.trim_end_matches('/'), path)),
        }
    }
}
