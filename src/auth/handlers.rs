use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
    repo_types::User,
};
use crate::{
    error::{AppError, ValidationError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys
        .sign_access(user.id, user.is_staff)
        .context("jwt sign access")?;
    let refresh_token = keys
        .sign_refresh(user.id, user.is_staff)
        .context("jwt sign refresh")?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ValidationError::InvalidEmail.into());
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ValidationError::PasswordTooShort.into());
    }

    let existing = User::find_by_email(&state.db, &payload.email)
        .await
        .context("find_by_email")?;
    if existing.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("email_taken"));
    }

    let hash = hash_password(&payload.password).context("hash_password")?;
    let user = User::create(&state.db, &payload.email, &hash)
        .await
        .context("create user")?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue_tokens(&state, user).map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ValidationError::InvalidEmail.into());
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email)
        .await
        .context("find_by_email")?
    else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("invalid_credentials"));
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .context("verify_password")?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("invalid_credentials"));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue_tokens(&state, user).map(Json)
}

/// Re-reads the user so a staff promotion or demotion shows up in the new pair.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("invalid_token")
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .context("find_by_id")?
        .ok_or(AppError::Unauthorized("unknown_user"))?;

    issue_tokens(&state, user).map(Json)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .context("find_by_id")?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "token for unknown user");
            AppError::Unauthorized("unknown_user")
        })?;

    Ok(Json(user.into()))
}
