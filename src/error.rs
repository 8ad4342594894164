use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Input rejected before anything is written. Each variant maps to a stable reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body is not valid json")]
    InvalidJson,
    #[error("amount must be greater than 0")]
    AmountNotPositive,
    #[error("amount is not a number")]
    InvalidAmount,
    #[error("nutrient values must not be negative")]
    NegativeNutrient,
    #[error("goal must be one of lose, maintain, gain")]
    UnrecognizedGoal,
    #[error("sex must be one of M, F, O")]
    UnrecognizedSex,
    #[error("activity level must be one of 1.2, 1.375, 1.55, 1.725, 1.9")]
    UnrecognizedActivityLevel,
    #[error("age, weight and height must be positive")]
    NonPositiveBodyMetrics,
    #[error("age is not a plausible whole number of years")]
    AgeOutOfRange,
    #[error("barcode is empty")]
    MissingBarcode,
    #[error("name is empty or too long")]
    InvalidName,
    #[error("email address is malformed")]
    InvalidEmail,
    #[error("password is too short")]
    PasswordTooShort,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::AmountNotPositive => "amount_must_be_positive",
            Self::InvalidAmount => "invalid_amount",
            Self::NegativeNutrient => "negative_values_not_allowed",
            Self::UnrecognizedGoal => "unrecognized_goal",
            Self::UnrecognizedSex => "unrecognized_sex",
            Self::UnrecognizedActivityLevel => "unrecognized_activity_level",
            Self::NonPositiveBodyMetrics => "non_positive_body_metrics",
            Self::AgeOutOfRange => "age_out_of_range",
            Self::MissingBarcode => "missing_barcode",
            Self::InvalidName => "invalid_name",
            Self::InvalidEmail => "invalid_email",
            Self::PasswordTooShort => "password_too_short",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Carries the reason code.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("caller is not allowed to do this")]
    Forbidden,
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("food lookup failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(v) => v.code(),
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(reason) => *reason,
            Self::Forbidden => "forbidden",
            Self::Conflict(reason) => *reason,
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        Self::Validation(ValidationError::InvalidJson)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        let body = json!({ "success": false, "error": self.code() });
        (self.status(), Json(body)).into_response()
    }
}
