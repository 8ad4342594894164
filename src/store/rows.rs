use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{
    CatalogEntry, CatalogItem, FreeformEntry, Nutrients, PartialNutrients, Profile,
};

#[derive(Debug, FromRow)]
pub(super) struct CatalogItemRow {
    pub id: Uuid,
    pub name: String,
    pub kcal_per100: f64,
    pub protein_per100: f64,
    pub fat_per100: f64,
    pub carbs_per100: f64,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(r: CatalogItemRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            per100: Nutrients::new(r.kcal_per100, r.protein_per100, r.fat_per100, r.carbs_per100),
        }
    }
}

/// Catalog entry joined with its item.
#[derive(Debug, FromRow)]
pub(super) struct CatalogEntryRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub amount: f64,
    pub initial_amount: f64,
    pub created_at: OffsetDateTime,
    pub item_id: Uuid,
    pub item_name: String,
    pub kcal_per100: f64,
    pub protein_per100: f64,
    pub fat_per100: f64,
    pub carbs_per100: f64,
}

impl From<CatalogEntryRow> for CatalogEntry {
    fn from(r: CatalogEntryRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            item: CatalogItem {
                id: r.item_id,
                name: r.item_name,
                per100: Nutrients::new(
                    r.kcal_per100,
                    r.protein_per100,
                    r.fat_per100,
                    r.carbs_per100,
                ),
            },
            amount: r.amount,
            initial_amount: r.initial_amount,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct FreeformEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub kcal_per100: Option<f64>,
    pub protein_per100: Option<f64>,
    pub fat_per100: Option<f64>,
    pub carbs_per100: Option<f64>,
    pub kcal_rate: f64,
    pub protein_rate: f64,
    pub fat_rate: f64,
    pub carbs_rate: f64,
    pub created_at: OffsetDateTime,
}

impl From<FreeformEntryRow> for FreeformEntry {
    fn from(r: FreeformEntryRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            amount: r.amount,
            values: Nutrients::new(r.kcal, r.protein, r.fat, r.carbs),
            per100: PartialNutrients {
                kcal: r.kcal_per100,
                protein: r.protein_per100,
                fat: r.fat_per100,
                carbs: r.carbs_per100,
            },
            rates: Nutrients::new(r.kcal_rate, r.protein_rate, r.fat_rate, r.carbs_rate),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ProfileRow {
    pub user_id: Uuid,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
}

impl From<ProfileRow> for Profile {
    // Columns hold codes written by `save_profile`; anything unparseable reads as unset.
    fn from(r: ProfileRow) -> Self {
        Self {
            user_id: r.user_id,
            age: r.age.and_then(|a| u32::try_from(a).ok()),
            sex: r.sex.and_then(|s| s.parse().ok()),
            weight_kg: r.weight_kg,
            height_cm: r.height_cm,
            activity: r.activity_level.and_then(|s| s.parse().ok()),
            goal: r.goal.and_then(|s| s.parse().ok()),
        }
    }
}
