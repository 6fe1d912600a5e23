//! PostgreSQL implementation of the `RecipeStore` port.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::database::postgres_service::DatabaseService;
use crate::database::store::{RecipeStore, StoreError, StoreResult};
use crate::models::{
    Attribute, AttributeKind, NewRecipe, NewUser, Price, Recipe, RecipeFilter, RecipeUpdate, User,
    UserChanges,
};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, is_staff, is_superuser";
const RECIPE_COLUMNS: &str = "id, user_id, title, time_minutes, price_cents, link, description, image";

/// `RecipeStore` backed by the pool owned by `DatabaseService`.
#[derive(Clone, Debug)]
pub struct PgStore {
    database: DatabaseService,
}

impl PgStore {
    /// Expects an already initialized `DatabaseService`.
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    fn pool(&self) -> StoreResult<&PgPool> {
        self.database
            .get_pool()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
    })
}

fn attribute_from_row(row: &PgRow) -> StoreResult<Attribute> {
    Ok(Attribute {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        user_id: row.try_get("user_id")?,
    })
}

fn recipe_from_row(row: &PgRow) -> StoreResult<Recipe> {
    let cents: i64 = row.try_get("price_cents")?;
    Ok(Recipe {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        time_minutes: row.try_get("time_minutes")?,
        price: Price::from_cents(cents).map_err(|e| StoreError::Storage(e.to_string()))?,
        link: row.try_get("link")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        tags: Vec::new(),
        ingredients: Vec::new(),
    })
}

/// Loads the attributes of `kind` linked to any of `recipe_ids`, grouped by recipe.
async fn load_links(
    pool: &PgPool,
    kind: AttributeKind,
    recipe_ids: &[i64],
) -> StoreResult<HashMap<i64, Vec<Attribute>>> {
    let query: String = format!(
        "SELECT l.recipe_id, a.id, a.name, a.user_id \
         FROM {link} l JOIN {table} a ON a.id = l.{column} \
         WHERE l.recipe_id = ANY($1) \
         ORDER BY a.id",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column(),
    );

    let rows: Vec<PgRow> = sqlx::query(&query).bind(recipe_ids).fetch_all(pool).await?;

    let mut grouped: HashMap<i64, Vec<Attribute>> = HashMap::new();
    for row in &rows {
        let recipe_id: i64 = row.try_get("recipe_id")?;
        grouped.entry(recipe_id).or_default().push(attribute_from_row(row)?);
    }
    Ok(grouped)
}

/// Fills `tags` and `ingredients` of every recipe with two batched queries
async fn hydrate(pool: &PgPool, mut recipes: Vec<Recipe>) -> StoreResult<Vec<Recipe>> {
    if recipes.is_empty() {
        return Ok(recipes);
    }

    let ids: Vec<i64> = recipes.iter().map(|recipe: &Recipe| recipe.id).collect();
    let mut tags: HashMap<i64, Vec<Attribute>> = load_links(pool, AttributeKind::Tag, &ids).await?;
    let mut ingredients: HashMap<i64, Vec<Attribute>> = load_links(pool, AttributeKind::Ingredient, &ids).await?;

    for recipe in &mut recipes {
        recipe.tags = tags.remove(&recipe.id).unwrap_or_default();
        recipe.ingredients = ingredients.remove(&recipe.id).unwrap_or_default();
    }
    Ok(recipes)
}

/// Replaces the attribute links of one recipe, ignoring ids the user does not own
async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    kind: AttributeKind,
    user_id: i64,
    recipe_id: i64,
    ids: &[i64],
) -> StoreResult<()> {
    let delete: String = format!("DELETE FROM {} WHERE recipe_id = $1", kind.link_table());
    sqlx::query(&delete).bind(recipe_id).execute(&mut **tx).await?;

    if ids.is_empty() {
        return Ok(());
    }

    let insert: String = format!(
        "INSERT INTO {link} (recipe_id, {column}) \
         SELECT $1, a.id FROM {table} a WHERE a.user_id = $2 AND a.id = ANY($3) \
         ON CONFLICT DO NOTHING",
        link = kind.link_table(),
        column = kind.link_column(),
        table = kind.table(),
    );
    sqlx::query(&insert)
        .bind(recipe_id)
        .bind(user_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let query: String = format!(
            "INSERT INTO users (email, name, password_hash, is_staff, is_superuser) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );

        let row: PgRow = sqlx::query(&query)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(self.pool()?)
            .await?;

        user_from_row(&row)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let query: String = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<PgRow> = sqlx::query(&query).bind(id).fetch_optional(self.pool()?).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query: String = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<PgRow> = sqlx::query(&query).bind(email).fetch_optional(self.pool()?).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let query: String = format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                name = COALESCE($3, name), \
                password_hash = COALESCE($4, password_hash), \
                is_active = COALESCE($5, is_active) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        let row: Option<PgRow> = sqlx::query(&query)
            .bind(id)
            .bind(changes.email)
            .bind(changes.name)
            .bind(changes.password_hash)
            .bind(changes.is_active)
            .fetch_optional(self.pool()?)
            .await?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(StoreError::NotFound(format!("user {id}"))),
        }
    }

    async fn get_or_create_token(&self, user_id: i64, candidate: &str) -> StoreResult<String> {
        // The no-op update makes RETURNING yield the existing key on conflict
        let key: String = sqlx::query_scalar(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING key
            "#,
        )
        .bind(candidate)
        .bind(user_id)
        .fetch_one(self.pool()?)
        .await?;

        Ok(key)
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let query: String = format!(
            "SELECT {} FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = $1",
            USER_COLUMNS
                .split(", ")
                .map(|column: &str| format!("u.{column}"))
                .collect::<Vec<String>>()
                .join(", ")
        );
        let row: Option<PgRow> = sqlx::query(&query).bind(token).fetch_optional(self.pool()?).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_attributes(
        &self,
        kind: AttributeKind,
        user_id: i64,
        assigned_only: bool,
    ) -> StoreResult<Vec<Attribute>> {
        let query: String = if assigned_only {
            format!(
                "SELECT a.id, a.name, a.user_id FROM {table} a \
                 WHERE a.user_id = $1 \
                 AND EXISTS (SELECT 1 FROM {link} l WHERE l.{column} = a.id) \
                 ORDER BY a.name DESC, a.id DESC",
                table = kind.table(),
                link = kind.link_table(),
                column = kind.link_column(),
            )
        } else {
            format!(
                "SELECT a.id, a.name, a.user_id FROM {} a WHERE a.user_id = $1 ORDER BY a.name DESC, a.id DESC",
                kind.table()
            )
        };

        let rows: Vec<PgRow> = sqlx::query(&query).bind(user_id).fetch_all(self.pool()?).await?;
        rows.iter().map(attribute_from_row).collect()
    }

    async fn create_attribute(&self, kind: AttributeKind, user_id: i64, name: &str) -> StoreResult<Attribute> {
        let query: String = format!(
            "INSERT INTO {} (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
            kind.table()
        );
        let row: PgRow = sqlx::query(&query).bind(name).bind(user_id).fetch_one(self.pool()?).await?;
        attribute_from_row(&row)
    }

    async fn get_or_create_attribute(
        &self,
        kind: AttributeKind,
        user_id: i64,
        name: &str,
    ) -> StoreResult<Attribute> {
        let query: String = format!(
            "SELECT id, name, user_id FROM {} WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
            kind.table()
        );
        let existing: Option<PgRow> = sqlx::query(&query)
            .bind(user_id)
            .bind(name)
            .fetch_optional(self.pool()?)
            .await?;

        match existing {
            Some(row) => attribute_from_row(&row),
            None => self.create_attribute(kind, user_id, name).await,
        }
    }

    async fn list_recipes(&self, user_id: i64, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let pool: &PgPool = self.pool()?;
        let query: String = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r \
             WHERE r.user_id = $1 \
             AND (cardinality($2::BIGINT[]) = 0 OR EXISTS \
                 (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2))) \
             AND (cardinality($3::BIGINT[]) = 0 OR EXISTS \
                 (SELECT 1 FROM recipe_ingredients ri WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3))) \
             ORDER BY r.id DESC"
        );

        let rows: Vec<PgRow> = sqlx::query(&query)
            .bind(user_id)
            .bind(&filter.tag_ids)
            .bind(&filter.ingredient_ids)
            .fetch_all(pool)
            .await?;

        let recipes: Vec<Recipe> = rows.iter().map(recipe_from_row).collect::<StoreResult<_>>()?;
        hydrate(pool, recipes).await
    }

    async fn get_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let pool: &PgPool = self.pool()?;
        let query: String = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2");
        let row: Option<PgRow> = sqlx::query(&query).bind(id).bind(user_id).fetch_optional(pool).await?;

        match row {
            Some(row) => Ok(hydrate(pool, vec![recipe_from_row(&row)?]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_recipe(&self, user_id: i64, recipe: NewRecipe) -> StoreResult<Recipe> {
        let pool: &PgPool = self.pool()?;
        let mut tx: Transaction<'static, Postgres> = pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price_cents, link, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price.cents())
        .bind(&recipe.link)
        .bind(&recipe.description)
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, AttributeKind::Tag, user_id, id, &recipe.tag_ids).await?;
        replace_links(&mut tx, AttributeKind::Ingredient, user_id, id, &recipe.ingredient_ids).await?;
        tx.commit().await?;

        self.get_recipe(user_id, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("recipe {id}")))
    }

    async fn update_recipe(&self, user_id: i64, id: i64, update: RecipeUpdate) -> StoreResult<Option<Recipe>> {
        let pool: &PgPool = self.pool()?;
        let mut tx: Transaction<'static, Postgres> = pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE recipes SET
                title = COALESCE($3, title),
                time_minutes = COALESCE($4, time_minutes),
                price_cents = COALESCE($5, price_cents),
                link = COALESCE($6, link),
                description = COALESCE($7, description)
            WHERE id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.title)
        .bind(update.time_minutes)
        .bind(update.price.map(Price::cents))
        .bind(update.link)
        .bind(update.description)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(tag_ids) = update.tag_ids {
            replace_links(&mut tx, AttributeKind::Tag, user_id, id, &tag_ids).await?;
        }
        if let Some(ingredient_ids) = update.ingredient_ids {
            replace_links(&mut tx, AttributeKind::Ingredient, user_id, id, &ingredient_ids).await?;
        }
        tx.commit().await?;

        self.get_recipe(user_id, id).await
    }

    async fn delete_recipe(&self, user_id: i64, id: i64) -> StoreResult<Option<Recipe>> {
        let Some(recipe) = self.get_recipe(user_id, id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool()?)
            .await?;

        Ok((result.rows_affected() > 0).then_some(recipe))
    }

    async fn set_recipe_image(&self, user_id: i64, id: i64, image: Option<String>) -> StoreResult<Option<Recipe>> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2 RETURNING id",
        )
        .bind(id)
        .bind(user_id)
        .bind(image)
        .fetch_optional(self.pool()?)
        .await?;

        match updated {
            Some(_) => self.get_recipe(user_id, id).await,
            None => Ok(None),
        }
    }

    async fn health(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(self.pool()?).await?;
        Ok(())
    }

    async fn shutdown(&self) {
        self.database.shutdown().await;
    }
}
