use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{BodyMetricsRequest, CalculatorForm, ProfileResponse, ProfileView},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    nutrition::recommendation::{recommend, ActivityLevel, Goal, Recommendation},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/calculator", get(calculator_form).post(calculate))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.store.profile(user_id).await?;
    Ok(Json(ProfileResponse::from(&profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BodyMetricsRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let Json(body) = payload?;
    let current = state.store.profile(user_id).await?;
    let updated = services::apply_update(&current, &body)?;
    let saved = state.store.save_profile(&updated).await?;
    info!(user_id = %user_id, complete = saved.metrics().is_some(), "profile updated");
    Ok(Json(ProfileResponse::from(&saved)))
}

#[instrument(skip(state))]
pub async fn calculator_form(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CalculatorForm>, AppError> {
    let profile = state.store.profile(user_id).await?;
    Ok(Json(CalculatorForm {
        initial: ProfileView::from(&profile),
        activity_levels: ActivityLevel::ALL,
        goals: [Goal::Lose, Goal::Maintain, Goal::Gain],
    }))
}

/// One-off calculation; nothing is stored.
#[instrument(skip(payload))]
pub async fn calculate(
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BodyMetricsRequest>, JsonRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let Json(body) = payload?;
    let metrics = services::calculator_metrics(&body)?;
    Ok(Json(recommend(&metrics)))
}
