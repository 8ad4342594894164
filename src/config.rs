use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Settings for the third-party food database (OpenFoodFacts compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct FoodLookupConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FoodLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".into(),
            timeout_secs: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Offset of the users' local calendar, used to bucket entries by day.
    pub utc_offset: UtcOffset,
    pub food_lookup: FoodLookupConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutrition-tracker".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "nutrition-tracker-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)?,
            Err(_) => UtcOffset::UTC,
        };
        let defaults = FoodLookupConfig::default();
        let food_lookup = FoodLookupConfig {
            base_url: std::env::var("FOOD_LOOKUP_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("FOOD_LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
        };
        Ok(Self {
            database_url,
            jwt,
            utc_offset,
            food_lookup,
        })
    }
}

/// Parses offsets written as `+HH:MM` / `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("invalid APP_UTC_OFFSET {raw:?}, expected +HH:MM"))
}
