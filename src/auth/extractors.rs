use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{Claims, JwtKeys, TokenKind};
use crate::{error::AppError, nutrition::Caller};

/// Claims of a valid access token, `None` when no Authorization header is sent.
fn access_claims(parts: &Parts, keys: &JwtKeys) -> Result<Option<Claims>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .ok_or(AppError::Unauthorized("invalid_authorization_header"))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("invalid_token")
    })?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("access_token_required"));
    }
    Ok(Some(claims))
}

fn missing_token() -> AppError {
    AppError::Unauthorized("missing_token")
}

/// Authenticated user id; rejects anonymous requests.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = access_claims(parts, &keys)?.ok_or_else(missing_token)?;
        Ok(AuthUser(claims.sub))
    }
}

/// Anonymous when no credentials are sent. A bad token is still a 401.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(match access_claims(parts, &keys)? {
            Some(claims) => Caller::User(claims.sub),
            None => Caller::Anonymous,
        })
    }
}

/// Authenticated catalog maintainer.
pub struct StaffUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = access_claims(parts, &keys)?.ok_or_else(missing_token)?;
        if !claims.staff {
            warn!(user_id = %claims.sub, "staff-only route refused");
            return Err(AppError::Forbidden);
        }
        Ok(StaffUser(claims.sub))
    }
}
