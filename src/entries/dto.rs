use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    input::NumberInput,
    nutrition::{
        aggregate::{DailyEnergy, TOTAL_PLACES},
        recommendation::Recommendation,
        EntryKind, LoggedEntry, NutrientSource, Nutrients,
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub product_id: Uuid,
    #[serde(default)]
    pub amount: Option<NumberInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCustomEntryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<NumberInput>,
    #[serde(default)]
    pub kcal: Option<NumberInput>,
    #[serde(default)]
    pub protein: Option<NumberInput>,
    #[serde(default)]
    pub fat: Option<NumberInput>,
    #[serde(default)]
    pub carbs: Option<NumberInput>,
    #[serde(default)]
    pub kcal_per100: Option<NumberInput>,
    #[serde(default)]
    pub protein_per100: Option<NumberInput>,
    #[serde(default)]
    pub fat_per100: Option<NumberInput>,
    #[serde(default)]
    pub carbs_per100: Option<NumberInput>,
}

#[derive(Debug, Deserialize)]
pub struct EditEntryRequest {
    #[serde(default)]
    pub amount: Option<NumberInput>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressParams {
    #[serde(default)]
    pub days: Option<String>,
}

/// An entry as listed to the client, values rounded for display.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: Uuid,
    pub origin: EntryKind,
    pub name: String,
    pub amount: f64,
    pub initial_amount: f64,
    #[serde(flatten)]
    pub values: Nutrients,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&LoggedEntry> for EntryView {
    fn from(e: &LoggedEntry) -> Self {
        Self {
            id: e.id(),
            origin: e.kind(),
            name: e.name().to_string(),
            amount: e.amount(),
            initial_amount: e.initial_amount(),
            values: e.nutrients().rounded(TOTAL_PLACES),
            created_at: e.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedEntryResponse {
    pub success: bool,
    pub id: Uuid,
    pub entry: EntryView,
}

/// Recomputed snapshot after an amount edit.
#[derive(Debug, Serialize)]
pub struct EditedEntryResponse {
    pub success: bool,
    pub id: Uuid,
    pub amount: f64,
    #[serde(flatten)]
    pub values: Nutrients,
}

#[derive(Debug, Serialize)]
pub struct DeletedEntryResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: String,
    pub entries: Vec<EntryView>,
    pub totals: Nutrients,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct DailyCaloriesResponse {
    pub dates: Vec<String>,
    pub calories: Vec<f64>,
}

impl From<Vec<DailyEnergy>> for DailyCaloriesResponse {
    fn from(series: Vec<DailyEnergy>) -> Self {
        let (dates, calories) = series
            .into_iter()
            .map(|d| (d.date.to_string(), d.kcal))
            .unzip();
        Self { dates, calories }
    }
}
