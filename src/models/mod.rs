// Start of file: /src/models/mod.rs

/*
    * This module groups all domain models: users, recipe attributes,
    * recipes, prices and the shared validation error type.
*/

pub mod attribute;
pub mod price;
pub mod recipe;
pub mod user;
pub mod validation;

pub use attribute::{Attribute, AttributeKind, Ingredient, Tag};
pub use price::Price;
pub use recipe::{NewRecipe, Recipe, RecipeFilter, RecipeUpdate};
pub use user::{NewUser, User, UserChanges};
pub use validation::ValidationErrors;

// End of file: /src/models/mod.rs
