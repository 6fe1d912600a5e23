// Recipe handlers: filtered listing, CRUD and image upload

use axum::{
    extract::{
        multipart::Field,
        rejection::{JsonRejection, PathRejection},
        Extension, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::api::middleware::AuthUser;
use crate::config::state::AppState;
use crate::core::media::ImageFormat;
use crate::database::store::StoreResult;
use crate::models::recipe::{RecipeDetail, RecipeFields, RecipeImage, RecipeRequest, RecipeSummary};
use crate::models::validation::ValidationErrors;
use crate::models::{AttributeKind, NewRecipe, Recipe, RecipeFilter, RecipeUpdate};
use crate::utils::response_handler::HandlerResponse;
use crate::utils::utils::parse_id_list;

/// Multipart field carrying the uploaded file
pub const IMAGE_FIELD: &str = "image";
const NO_FILE: &str = "No file was submitted.";
const NOT_AN_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    /// Comma separated tag ids
    pub tags: Option<String>,
    /// Comma separated ingredient ids
    pub ingredients: Option<String>,
}

impl RecipeListParams {
    fn into_filter(self) -> Result<RecipeFilter, ValidationErrors> {
        let mut errors: ValidationErrors = ValidationErrors::new();
        let mut filter: RecipeFilter = RecipeFilter::default();

        match parse_id_list(self.tags.as_deref().unwrap_or_default()) {
            Ok(ids) => filter.tag_ids = ids,
            Err(message) => errors.add("tags", message),
        }
        match parse_id_list(self.ingredients.as_deref().unwrap_or_default()) {
            Ok(ids) => filter.ingredient_ids = ids,
            Err(message) => errors.add("ingredients", message),
        }

        errors.finish(filter)
    }
}

fn detail(recipe: &Recipe) -> Value {
    json!(RecipeDetail::from(recipe))
}

/// Non-numeric ids can never match a recipe
fn recipe_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, HandlerResponse> {
    path.map(|Path(id)| id).map_err(|_| HandlerResponse::not_found())
}

/// Turns nested `{name}` payloads into the caller's attribute ids, creating missing ones
async fn resolve_attributes(
    state: &AppState,
    kind: AttributeKind,
    user_id: i64,
    names: &[String],
) -> StoreResult<Vec<i64>> {
    let mut ids: Vec<i64> = Vec::with_capacity(names.len());
    for name in names {
        ids.push(state.store.get_or_create_attribute(kind, user_id, name).await?.id);
    }
    Ok(ids)
}

async fn resolve_optional(
    state: &AppState,
    kind: AttributeKind,
    user_id: i64,
    names: Option<Vec<String>>,
) -> StoreResult<Option<Vec<i64>>> {
    match names {
        Some(names) => Ok(Some(resolve_attributes(state, kind, user_id, &names).await?)),
        None => Ok(None),
    }
}

fn parse_payload(
    payload: Result<Json<RecipeRequest>, JsonRejection>,
    partial: bool,
) -> Result<RecipeFields, HandlerResponse> {
    let Json(request) = payload.map_err(HandlerResponse::json_rejection)?;
    request.validate(partial).map_err(HandlerResponse::validation)
}

/// Lists the caller's recipes, optionally filtered by tag and ingredient ids
#[instrument(name = "list_recipes", skip_all, fields(user_id = user.0.id))]
pub async fn list_recipes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<RecipeListParams>,
) -> HandlerResponse {
    let filter: RecipeFilter = match params.into_filter() {
        Ok(filter) => filter,
        Err(errors) => return HandlerResponse::validation(errors),
    };

    match state.store.list_recipes(user.0.id, &filter).await {
        Ok(recipes) => {
            let summaries: Vec<RecipeSummary<'_>> = recipes.iter().map(RecipeSummary::from).collect();
            HandlerResponse::new(StatusCode::OK).data(json!(summaries))
        }
        Err(e) => HandlerResponse::from_store_error("Failed to list recipes", e),
    }
}

/// Creates a recipe for the caller
#[instrument(name = "create_recipe", skip_all, fields(user_id = user.0.id))]
pub async fn create_recipe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> HandlerResponse {
    let fields: RecipeFields = match parse_payload(payload, false) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let (Some(title), Some(time_minutes), Some(price)) = (fields.title, fields.time_minutes, fields.price) else {
        return HandlerResponse::new(StatusCode::BAD_REQUEST).message("Incomplete recipe payload");
    };
    let user_id: i64 = user.0.id;

    let tag_ids: Vec<i64> = match resolve_attributes(&state, AttributeKind::Tag, user_id, &fields.tag_names.unwrap_or_default()).await {
        Ok(ids) => ids,
        Err(e) => return HandlerResponse::from_store_error("Failed to resolve tags", e),
    };
    let ingredient_ids: Vec<i64> = match resolve_attributes(&state, AttributeKind::Ingredient, user_id, &fields.ingredient_names.unwrap_or_default()).await {
        Ok(ids) => ids,
        Err(e) => return HandlerResponse::from_store_error("Failed to resolve ingredients", e),
    };

    let new_recipe: NewRecipe = NewRecipe {
        title,
        time_minutes,
        price,
        link: fields.link.unwrap_or_default(),
        description: fields.description.unwrap_or_default(),
        tag_ids,
        ingredient_ids,
    };

    match state.store.create_recipe(user_id, new_recipe).await {
        Ok(recipe) => {
            info!("Created recipe {} ({})", recipe.id, recipe);
            HandlerResponse::new(StatusCode::CREATED)
                .data(detail(&recipe))
                .message("Recipe created successfully")
        }
        Err(e) => HandlerResponse::from_store_error("Failed to create recipe", e),
    }
}

/// Returns one of the caller's recipes
#[instrument(name = "get_recipe", skip_all, fields(user_id = user.0.id))]
pub async fn get_recipe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResponse {
    let id: i64 = match recipe_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.store.get_recipe(user.0.id, id).await {
        Ok(Some(recipe)) => HandlerResponse::new(StatusCode::OK).data(detail(&recipe)),
        Ok(None) => HandlerResponse::not_found(),
        Err(e) => HandlerResponse::from_store_error("Failed to load recipe", e),
    }
}

async fn update_recipe(
    state: AppState,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
    partial: bool,
) -> HandlerResponse {
    let id: i64 = match recipe_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user_id: i64 = user.0.id;

    // A missing recipe wins over an invalid body
    match state.store.get_recipe(user_id, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return HandlerResponse::not_found(),
        Err(e) => return HandlerResponse::from_store_error("Failed to load recipe", e),
    }

    let fields: RecipeFields = match parse_payload(payload, partial) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let tag_ids: Option<Vec<i64>> = match resolve_optional(&state, AttributeKind::Tag, user_id, fields.tag_names).await {
        Ok(ids) => ids,
        Err(e) => return HandlerResponse::from_store_error("Failed to resolve tags", e),
    };
    let ingredient_ids: Option<Vec<i64>> = match resolve_optional(&state, AttributeKind::Ingredient, user_id, fields.ingredient_names).await {
        Ok(ids) => ids,
        Err(e) => return HandlerResponse::from_store_error("Failed to resolve ingredients", e),
    };

    let update: RecipeUpdate = RecipeUpdate {
        title: fields.title,
        time_minutes: fields.time_minutes,
        price: fields.price,
        link: fields.link,
        description: fields.description,
        tag_ids,
        ingredient_ids,
    };

    match state.store.update_recipe(user_id, id, update).await {
        Ok(Some(recipe)) => {
            info!("Updated recipe {}", recipe.id);
            HandlerResponse::new(StatusCode::OK)
                .data(detail(&recipe))
                .message("Recipe updated successfully")
        }
        Ok(None) => HandlerResponse::not_found(),
        Err(e) => HandlerResponse::from_store_error("Failed to update recipe", e),
    }
}

/// PUT: title, time_minutes and price are required
#[instrument(name = "replace_recipe", skip_all, fields(user_id = user.0.id))]
pub async fn replace_recipe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> HandlerResponse {
    update_recipe(state, user, path, payload, false).await
}

/// PATCH: only the given fields change
#[instrument(name = "patch_recipe", skip_all, fields(user_id = user.0.id))]
pub async fn patch_recipe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> HandlerResponse {
    update_recipe(state, user, path, payload, true).await
}

/// Deletes a recipe and its image file. Answers 204 with no body.
#[instrument(name = "delete_recipe", skip_all, fields(user_id = user.0.id))]
pub async fn delete_recipe_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let id: i64 = match recipe_id(path) {
        Ok(id) => id,
        Err(response) => return response.into_response(),
    };

    match state.store.delete_recipe(user.0.id, id).await {
        Ok(Some(recipe)) => {
            if let Some(image) = recipe.image.as_deref() {
                state.media.remove(image).await;
            }
            info!("Deleted recipe {}", recipe.id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(None) => HandlerResponse::not_found().into_response(),
        Err(e) => HandlerResponse::from_store_error("Failed to delete recipe", e).into_response(),
    }
}

/// The uploaded image as read from the multipart body
struct UploadedImage {
    filename: String,
    bytes: Vec<u8>,
}

async fn read_image_field(mut multipart: Multipart) -> Result<Option<UploadedImage>, HandlerResponse> {
    loop {
        let field: Option<Field<'_>> = multipart.next_field().await.map_err(|e| {
            HandlerResponse::new(e.status()).message(e.body_text())
        })?;
        let Some(field) = field else {
            return Ok(None);
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename: String = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| {
            HandlerResponse::new(e.status()).message(e.body_text())
        })?;

        return Ok(Some(UploadedImage { filename, bytes: bytes.to_vec() }));
    }
}

/// Stores an image for one of the caller's recipes, replacing any previous one
#[instrument(name = "upload_recipe_image", skip_all, fields(user_id = user.0.id))]
pub async fn upload_image_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> HandlerResponse {
    let id: i64 = match recipe_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user_id: i64 = user.0.id;

    let previous: Recipe = match state.store.get_recipe(user_id, id).await {
        Ok(Some(recipe)) => recipe,
        Ok(None) => return HandlerResponse::not_found(),
        Err(e) => return HandlerResponse::from_store_error("Failed to load recipe", e),
    };

    let multipart: Multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Image upload without a multipart body: {}", rejection.body_text());
            return HandlerResponse::validation(ValidationErrors::single(IMAGE_FIELD, NO_FILE));
        }
    };

    let upload: UploadedImage = match read_image_field(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return HandlerResponse::validation(ValidationErrors::single(IMAGE_FIELD, NO_FILE)),
        Err(response) => return response,
    };

    let format: ImageFormat = match ImageFormat::detect(&upload.bytes) {
        Some(format) => format,
        None => return HandlerResponse::validation(ValidationErrors::single(IMAGE_FIELD, NOT_AN_IMAGE)),
    };

    debug!("Received {:?} upload {:?} for recipe {}", format, upload.filename, id);
    let stored: String = match state.media.save_recipe_image(format, &upload.bytes).await {
        Ok(path) => path,
        Err(e) => return HandlerResponse::internal("Failed to store image", format!("{:#}", e)),
    };

    match state.store.set_recipe_image(user_id, id, Some(stored.clone())).await {
        Ok(Some(recipe)) => {
            if let Some(old) = previous.image.as_deref() {
                state.media.remove(old).await;
            }
            info!("Stored image {} for recipe {}", stored, recipe.id);
            HandlerResponse::new(StatusCode::OK)
                .data(json!(RecipeImage::new(&recipe, state.media.url())))
                .message("Image uploaded successfully")
        }
        Ok(None) => {
            // Deleted while the upload was in flight
            state.media.remove(&stored).await;
            HandlerResponse::not_found()
        }
        Err(e) => {
            state.media.remove(&stored).await;
            HandlerResponse::from_store_error("Failed to attach image", e)
        }
    }
}
