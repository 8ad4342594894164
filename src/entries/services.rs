use time::{Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::CreateCustomEntryRequest;
use crate::{
    error::{AppError, ValidationError},
    input::read_number,
    nutrition::{
        aggregate::{self, DailyEnergy, DayRange},
        ensure_can_mutate,
        recommendation::Recommendation,
        recompute::{self, apply_amount, validate_amount},
        Caller, CatalogEntry, FreeformEntry, LoggedEntry, NutrientSource, Nutrients,
        PartialNutrients,
    },
    state::AppState,
    store::{NewCatalogEntry, NewFreeformEntry},
};

pub const DEFAULT_CUSTOM_NAME: &str = "Custom";
pub const DEFAULT_CUSTOM_AMOUNT: f64 = 100.0;
pub const MAX_NAME_CHARS: usize = 255;

/// Trimmed name, `Custom` when blank.
pub fn custom_name(raw: Option<&str>) -> Result<String, ValidationError> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::InvalidName);
    }
    Ok(if name.is_empty() {
        DEFAULT_CUSTOM_NAME.to_string()
    } else {
        name.to_string()
    })
}

/// Parsed and validated freeform payload. An omitted or zero amount means 100.
pub fn resolve_custom(
    body: &CreateCustomEntryRequest,
) -> Result<(String, recompute::ResolvedFreeform), ValidationError> {
    let name = custom_name(body.name.as_deref())?;
    let amount = match read_number(body.amount.as_ref())? {
        None => DEFAULT_CUSTOM_AMOUNT,
        Some(a) if a == 0.0 => DEFAULT_CUSTOM_AMOUNT,
        Some(a) => a,
    };
    let direct = PartialNutrients {
        kcal: read_number(body.kcal.as_ref())?,
        protein: read_number(body.protein.as_ref())?,
        fat: read_number(body.fat.as_ref())?,
        carbs: read_number(body.carbs.as_ref())?,
    };
    let per100 = PartialNutrients {
        kcal: read_number(body.kcal_per100.as_ref())?,
        protein: read_number(body.protein_per100.as_ref())?,
        fat: read_number(body.fat_per100.as_ref())?,
        carbs: read_number(body.carbs_per100.as_ref())?,
    };
    let resolved = recompute::resolve_freeform(amount, direct, per100)?;
    Ok((name, resolved))
}

pub async fn create_catalog_entry(
    state: &AppState,
    caller: Caller,
    product_id: Uuid,
    amount: Option<f64>,
) -> Result<CatalogEntry, AppError> {
    let amount = validate_amount(amount.ok_or(ValidationError::InvalidAmount)?)?;
    let entry = state
        .store
        .insert_catalog_entry(NewCatalogEntry {
            user_id: caller.user_id(),
            item_id: product_id,
            amount,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;
    info!(
        entry_id = %entry.id,
        user_id = ?entry.user_id,
        product_id = %product_id,
        amount,
        "catalog entry created"
    );
    Ok(entry)
}

pub async fn create_freeform_entry(
    state: &AppState,
    user_id: Uuid,
    body: &CreateCustomEntryRequest,
) -> Result<FreeformEntry, AppError> {
    let (name, resolved) = resolve_custom(body)?;
    let entry = state
        .store
        .insert_freeform_entry(NewFreeformEntry {
            user_id,
            name,
            resolved,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;
    info!(
        entry_id = %entry.id,
        user_id = %user_id,
        amount = entry.amount,
        kcal = entry.values.kcal,
        "freeform entry created"
    );
    Ok(entry)
}

fn audit_forbidden(err: &AppError, action: &str, entry_id: Uuid, caller: Caller) {
    if matches!(err, AppError::Forbidden) {
        warn!(
            entry_id = %entry_id,
            caller = ?caller.user_id(),
            action,
            "unauthorized entry mutation refused"
        );
    }
}

/// Ownership check and recompute run against the locked entry.
pub async fn edit_entry(
    state: &AppState,
    caller: Caller,
    entry_id: Uuid,
    amount: Option<f64>,
) -> Result<LoggedEntry, AppError> {
    let amount = validate_amount(amount.ok_or(ValidationError::InvalidAmount)?)?;
    let edit = move |entry: LoggedEntry| -> Result<LoggedEntry, AppError> {
        ensure_can_mutate(&entry, caller)?;
        Ok(apply_amount(entry, amount))
    };
    let updated = state
        .store
        .update_entry(entry_id, &edit)
        .await
        .inspect_err(|e| audit_forbidden(e, "edit", entry_id, caller))?;

    let values = updated.nutrients();
    info!(
        entry_id = %entry_id,
        user_id = ?caller.user_id(),
        kind = ?updated.kind(),
        amount,
        kcal = values.kcal,
        protein = values.protein,
        fat = values.fat,
        carbs = values.carbs,
        "entry amount updated"
    );
    Ok(updated)
}

pub async fn delete_entry(
    state: &AppState,
    caller: Caller,
    entry_id: Uuid,
) -> Result<LoggedEntry, AppError> {
    let check = move |entry: &LoggedEntry| ensure_can_mutate(entry, caller);
    let deleted = state
        .store
        .delete_entry(entry_id, &check)
        .await
        .inspect_err(|e| audit_forbidden(e, "delete", entry_id, caller))?;
    info!(
        entry_id = %entry_id,
        user_id = ?caller.user_id(),
        kind = ?deleted.kind(),
        "entry deleted"
    );
    Ok(deleted)
}

pub struct Today {
    pub date: Date,
    pub entries: Vec<LoggedEntry>,
    pub totals: Nutrients,
    pub recommendation: Option<Recommendation>,
}

pub async fn today(state: &AppState, caller: Caller, now: OffsetDateTime) -> Result<Today, AppError> {
    let offset = state.config.utc_offset;
    let date = aggregate::local_today(now, offset);
    let (start, end) = DayRange::single(date).bounds(offset);
    let entries = state.store.entries_between(caller, start, end).await?;
    let totals = aggregate::totals(&entries);
    let recommendation = match caller.user_id() {
        Some(user_id) => state.store.profile(user_id).await?.recommendation(),
        None => None,
    };
    Ok(Today {
        date,
        entries,
        totals,
        recommendation,
    })
}

/// Non-numeric `days` falls back to the default window.
pub fn parse_days(raw: Option<&str>) -> i64 {
    raw.and_then(|d| d.trim().parse::<i64>().ok())
        .map(aggregate::clamp_days)
        .unwrap_or(aggregate::DEFAULT_HISTORY_DAYS)
}

pub async fn daily_calories(
    state: &AppState,
    caller: Caller,
    days: i64,
    now: OffsetDateTime,
) -> Result<Vec<DailyEnergy>, AppError> {
    let offset = state.config.utc_offset;
    let range = DayRange::ending(aggregate::local_today(now, offset), days);
    let (start, end) = range.bounds(offset);
    let entries = state.store.entries_between(caller, start, end).await?;
    Ok(aggregate::daily_energy(&entries, range, offset))
}
