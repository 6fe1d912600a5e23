//! In-process `RecipeStore` used for `STORAGE_BACKEND=memory` and tests.
//!
//! All data lives behind a single `RwLock`; ids are assigned from per-table
//! counters starting at 1, like a `BIGSERIAL` column would.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::store::{RecipeStore, StoreError, StoreResult};
use crate::models::{
    Attribute, AttributeKind, NewRecipe, NewUser, Price, Recipe, RecipeFilter, RecipeUpdate, User,
    UserChanges,
};

#[derive(Debug, Clone)]
struct RecipeRow {
    user_id: i64,
    title: String,
    time_minutes: i32,
    price: Price,
    link: String,
    description: String,
    image: Option<String>,
    tag_ids: BTreeSet<i64>,
    ingredient_ids: BTreeSet<i64>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: HashMap<&'static str, i64>,
    users: BTreeMap<i64, User>,
    tokens: HashMap<String, i64>,
    tags: BTreeMap<i64, Attribute>,
    ingredients: BTreeMap<i64, Attribute>,
    recipes: BTreeMap<i64, RecipeRow>,
}

impl Tables {
    fn allocate(&mut self, table: &'static str) -> i64 {
        let counter: &mut i64 = self.next_id.entry(table).or_insert(0);
        *counter += 1;
        *counter
    }

    fn attributes(&self, kind: AttributeKind) -> &BTreeMap<i64, Attribute> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> &mut BTreeMap<i64, Attribute> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }

    fn insert_attribute(&mut self, kind: AttributeKind, user_id: i64, name: &str) -> Attribute {
        let id: i64 = self.allocate(kind.table());
        let attribute: Attribute = Attribute { id, name: name.to_owned(), user_id };
        self.attributes_mut(kind).insert(id, attribute.clone());
        attribute
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user: &User| user.email == email && Some(user.id) != except)
    }

    /// Keeps only ids that name an attribute of this user
    fn owned_ids(&self, kind: AttributeKind, user_id: i64, ids: &[i64]) -> BTreeSet<i64> {
        let table: &BTreeMap<i64, Attribute> = self.attributes(kind);
        ids.iter()
            .copied()
            .filter(|id: &i64| table.get(id).is_some_and(|a: &Attribute| a.user_id == user_id))
            .collect()
    }

    fn hydrate(&self, id: i64, row: &RecipeRow) -> Recipe {
        let collect = |kind: AttributeKind, ids: &BTreeSet<i64>| -> Vec<Attribute> {
            let table: &BTreeMap<i64, Attribute> = self.attributes(kind);
            ids.iter().filter_map(|id: &i64| table.get(id).cloned()).collect()
        };

        Recipe {
            id,
            user_id: row.user_id,
            title: row.title.clone(),
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link.clone(),
            description: row.description.clone(),
            image: row.image.clone(),
            tags: collect(AttributeKind::Tag, &row.tag_ids),
            ingredients: collect(AttributeKind::Ingredient, &row.ingredient_ids),
        }
    }

    fn owned_recipe(&self, user_id: i64, id: i64) -> Option<&RecipeRow> {
        self.recipes.get(&id).filter(|row: &&RecipeRow| row.user_id == user_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::AlreadyExists(format!("user with email {}", user.email)));
        }

        let id: i64 = tables.allocate("users");
        let user: User = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user: &&User| user.email == email).cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(email) = changes.email.as_deref() {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::AlreadyExists(format!("user with email {email}")));
            }
        }

        let user: &mut User = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        Ok(user.clone())
    }

    async fn get_or_create_token(&self, user_id: i64, candidate: &str) -> StoreResult<String> {
        let mut tables = self.tables.write().await;
        if let Some((token, _)) = tables.tokens.iter().find(|(_, owner)| **owner == user_id) {
            return Ok(token.clone());
        }
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }

        tables.tokens.insert(candidate.to_owned(), user_id);
        Ok(candidate.to_owned())
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(token)
            .and_then(|user_id: &i64| tables.users.get(user_id))
            .cloned())
    }

    async fn list_attributes(
        &self,
        kind: AttributeKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<Attribute>> {
        let tables = self.tables.read().await;
        let assigned = |id: i64| {
            tables.recipes.values().any(|row: &RecipeRow| match kind {
                AttributeKind::Tag => row.tag_ids.contains(&id),
                AttributeKind::Ingredient => row.ingredient_ids.contains(&id),
            })
        };

        let mut attributes: Vec<Attribute> = tables
            .attributes(kind)
            .values()
            .filter(|a: &&Attribute| a.user_id == user_id)
            .filter(|a: &&Attribute| !assigned_only || assigned(a.id))
            .cloned()
            .collect();
        attributes.sort_by(|a: &Attribute, b: &Attribute| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(attributes)
    }

    async fn create_attribute(&self, kind: AttributeKind, user_id: i64, name: &str) -> StoreResult<Attribute> {
        Ok(self.tables.write().await.insert_attribute(kind, user_id, name))
    }

    async fn get_or_create_attribute(
        &self,
        kind: AttributeKind,
        user_id: i64,
        name: &str,
    ) -> StoreResult<Attribute> {
        let mut tables = self.tables.write().await;
        let existing: Option<Attribute> = tables
            .attributes(kind)
            .values()
            .find(|a: &&Attribute| a.user_id == user_id && a.name == name)
            .cloned();

        Ok(match existing {
            Some(attribute) => attribute,
            None => tables.insert_attribute(kind, user_id, name),
        })
    }

    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .iter()
            .rev()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, row)| tables.hydrate(*id, row))
            .filter(|recipe: &Recipe| filter.matches(recipe))
            .collect())
    }

    async fn get_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let tables = self.tables.read().await;
        Ok(tables.owned_recipe(user_id, id).map(|row: &RecipeRow| tables.hydrate(id, row)))
    }

    async fn create_recipe(&self, user_id: i64, recipe: NewRecipe) -> StoreResult<Recipe> {
        let mut tables = self.tables.write().await;
        let row: RecipeRow = RecipeRow {
            user_id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            description: recipe.description,
            image: None,
            tag_ids: tables.owned_ids(AttributeKind::Tag, user_id, &recipe.tag_ids),
            ingredient_ids: tables.owned_ids(AttributeKind::Ingredient, user_id, &recipe.ingredient_ids),
        };

        let id: i64 = tables.allocate("recipes");
        let created: Recipe = tables.hydrate(id, &row);
        tables.recipes.insert(id, row);
        Ok(created)
    }

    async fn update_recipe(&self, user_id: i64, id: i64, update: RecipeUpdate) -> StoreResult<Option<Recipe>> {
        let mut tables = self.tables.write().await;
        let Some(mut row) = tables.owned_recipe(user_id, id).cloned() else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            row.title = title;
        }
        if let Some(time_minutes) = update.time_minutes {
            row.time_minutes = time_minutes;
        }
        if let Some(price) = update.price {
            row.price = price;
        }
        if let Some(link) = update.link {
            row.link = link;
        }
        if let Some(description) = update.description {
            row.description = description;
        }
        if let Some(tag_ids) = update.tag_ids {
            row.tag_ids = tables.owned_ids(AttributeKind::Tag, user_id, &tag_ids);
        }
        if let Some(ingredient_ids) = update.ingredient_ids {
            row.ingredient_ids = tables.owned_ids(AttributeKind::Ingredient, user_id, &ingredient_ids);
        }

        let updated: Recipe = tables.hydrate(id, &row);
        tables.recipes.insert(id, row);
        Ok(Some(updated))
    }

    async fn delete_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let mut tables = self.tables.write().await;
        if tables.owned_recipe(user_id, id).is_none() {
            return Ok(None);
        }

        let deleted: Option<Recipe> = tables
            .recipes
            .remove(&id)
            .map(|row: RecipeRow| tables.hydrate(id, &row));
        Ok(deleted)
    }

    async fn set_recipe_image(&self, user_id: i64, id: i64, image: Option<String>) -> StoreResult<Option<Recipe>> {
        let mut tables = self.tables.write().await;
        let Some(mut row) = tables.owned_recipe(user_id, id).cloned() else {
            return Ok(None);
        };

        row.image = image;
        let updated: Recipe = tables.hydrate(id, &row);
        tables.recipes.insert(id, row);
        Ok(Some(updated))
    }

    async fn health(&self) -> StoreResult<()> {
        Ok(())
    }
}
