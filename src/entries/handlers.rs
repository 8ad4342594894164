use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        CreateCustomEntryRequest, CreateEntryRequest, CreatedEntryResponse,
        DailyCaloriesResponse, DeletedEntryResponse, EditEntryRequest, EditedEntryResponse,
        EntryView, ProgressParams, TodayResponse,
    },
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    input::read_number,
    nutrition::{recompute::STORED_PLACES, Caller, LoggedEntry, NutrientSource},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/today", get(today))
        .route("/progress/daily-calories", get(daily_calories))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/entries", post(create_entry))
        .route("/entries/custom", post(create_custom_entry))
        .route("/entries/:id", delete(delete_entry))
        .route("/entries/:id/edit", post(edit_entry))
        .route("/entries/:id/delete", post(delete_entry))
}

fn created(entry: LoggedEntry) -> (StatusCode, Json<CreatedEntryResponse>) {
    (
        StatusCode::CREATED,
        Json(CreatedEntryResponse {
            success: true,
            id: entry.id(),
            entry: EntryView::from(&entry),
        }),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedEntryResponse>), AppError> {
    let Json(body) = payload?;
    let amount = read_number(body.amount.as_ref())?;
    let entry = services::create_catalog_entry(&state, caller, body.product_id, amount).await?;
    Ok(created(LoggedEntry::Catalog(entry)))
}

#[instrument(skip(state, payload))]
pub async fn create_custom_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateCustomEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedEntryResponse>), AppError> {
    let Json(body) = payload?;
    let entry = services::create_freeform_entry(&state, user_id, &body).await?;
    Ok(created(LoggedEntry::Freeform(entry)))
}

#[instrument(skip(state, payload))]
pub async fn edit_entry(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    payload: Result<Json<EditEntryRequest>, JsonRejection>,
) -> Result<Json<EditedEntryResponse>, AppError> {
    let Json(body) = payload?;
    let amount = read_number(body.amount.as_ref())?;
    let updated = services::edit_entry(&state, caller, id, amount).await?;
    Ok(Json(EditedEntryResponse {
        success: true,
        id: updated.id(),
        amount: updated.amount(),
        values: updated.nutrients().rounded(STORED_PLACES),
    }))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedEntryResponse>, AppError> {
    services::delete_entry(&state, caller, id).await?;
    Ok(Json(DeletedEntryResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<TodayResponse>, AppError> {
    let today = services::today(&state, caller, OffsetDateTime::now_utc()).await?;
    Ok(Json(TodayResponse {
        date: today.date.to_string(),
        entries: today.entries.iter().map(EntryView::from).collect(),
        totals: today.totals,
        recommendation: today.recommendation,
    }))
}

#[instrument(skip(state))]
pub async fn daily_calories(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ProgressParams>,
) -> Result<Json<DailyCaloriesResponse>, AppError> {
    let days = services::parse_days(params.days.as_deref());
    let series = services::daily_calories(&state, caller, days, OffsetDateTime::now_utc()).await?;
    Ok(Json(series.into()))
}
