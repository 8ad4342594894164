use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CatalogResponse, CreateCatalogItemRequest};
use crate::{
    auth::StaffUser,
    error::{AppError, ValidationError},
    input::read_number,
    nutrition::{CatalogItem, Nutrients},
    state::AppState,
};

const MAX_NAME_CHARS: usize = 255;

pub fn routes() -> Router<AppState> {
    Router::new().route("/catalog", get(list_catalog).post(create_catalog_item))
}

/// Name and baseline of a new item; missing nutrients are 0.
fn validate_item(body: &CreateCatalogItemRequest) -> Result<(String, Nutrients), ValidationError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::InvalidName);
    }
    let per100 = Nutrients::new(
        read_number(body.kcal_per100.as_ref())?.unwrap_or(0.0),
        read_number(body.protein_per100.as_ref())?.unwrap_or(0.0),
        read_number(body.fat_per100.as_ref())?.unwrap_or(0.0),
        read_number(body.carbs_per100.as_ref())?.unwrap_or(0.0),
    );
    if per100.any_negative() {
        return Err(ValidationError::NegativeNutrient);
    }
    Ok((name.to_string(), per100))
}

#[instrument(skip(state))]
pub async fn list_catalog(State(state): State<AppState>) -> Result<Json<CatalogResponse>, AppError> {
    let items = state.store.list_catalog().await?;
    Ok(Json(CatalogResponse { items }))
}

#[instrument(skip(state, payload))]
pub async fn create_catalog_item(
    State(state): State<AppState>,
    StaffUser(staff_id): StaffUser,
    payload: Result<Json<CreateCatalogItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogItem>), AppError> {
    let Json(body) = payload?;
    let (name, per100) = validate_item(&body)?;
    let item = state.store.insert_catalog_item(&name, per100).await?;
    info!(item_id = %item.id, staff_id = %staff_id, name = %item.name, "catalog item created");
    Ok((StatusCode::CREATED, Json(item)))
}
