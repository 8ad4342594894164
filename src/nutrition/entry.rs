use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::nutrients::{NutrientSource, Nutrients};
use crate::error::AppError;

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    User(Uuid),
    Anonymous,
}

impl Caller {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::User(id) => Some(*id),
            Caller::Anonymous => None,
        }
    }
}

/// A shared food with its per-100-unit baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub per100: Nutrients,
}

/// "Ate `amount` of this catalog item". Absolute values are never stored; they
/// follow the item's current baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub item: CatalogItem,
    pub amount: f64,
    pub initial_amount: f64,
    pub created_at: OffsetDateTime,
}

/// Nutrient set where any field may be missing, e.g. the optional per-100
/// baseline of a freeform entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PartialNutrients {
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
}

/// An entry carrying its own nutrient data (manual input or external lookup).
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub values: Nutrients,
    pub per100: PartialNutrients,
    /// Per-unit rates fixed at creation, unrounded. Amount edits scale these.
    pub rates: Nutrients,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoggedEntry {
    Catalog(CatalogEntry),
    Freeform(FreeformEntry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Catalog,
    Freeform,
}

impl NutrientSource for CatalogEntry {
    fn nutrients(&self) -> Nutrients {
        self.item.per100.with_derived_energy().for_amount(self.amount)
    }
}

impl NutrientSource for FreeformEntry {
    fn nutrients(&self) -> Nutrients {
        self.values
    }
}

impl NutrientSource for LoggedEntry {
    fn nutrients(&self) -> Nutrients {
        match self {
            LoggedEntry::Catalog(e) => e.nutrients(),
            LoggedEntry::Freeform(e) => e.nutrients(),
        }
    }
}

impl LoggedEntry {
    pub fn id(&self) -> Uuid {
        match self {
            LoggedEntry::Catalog(e) => e.id,
            LoggedEntry::Freeform(e) => e.id,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            LoggedEntry::Catalog(_) => EntryKind::Catalog,
            LoggedEntry::Freeform(_) => EntryKind::Freeform,
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        match self {
            LoggedEntry::Catalog(e) => e.user_id,
            LoggedEntry::Freeform(e) => Some(e.user_id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LoggedEntry::Catalog(e) => &e.item.name,
            LoggedEntry::Freeform(e) => &e.name,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            LoggedEntry::Catalog(e) => e.amount,
            LoggedEntry::Freeform(e) => e.amount,
        }
    }

    pub fn initial_amount(&self) -> f64 {
        match self {
            LoggedEntry::Catalog(e) => e.initial_amount,
            LoggedEntry::Freeform(e) => e.amount,
        }
    }

    pub fn created_at(&self) -> OffsetDateTime {
        match self {
            LoggedEntry::Catalog(e) => e.created_at,
            LoggedEntry::Freeform(e) => e.created_at,
        }
    }
}

/// An owned entry may only be changed by its owner. Entries without an owner
/// are public and pass.
pub fn ensure_can_mutate(entry: &LoggedEntry, caller: Caller) -> Result<(), AppError> {
    match entry.owner() {
        None => Ok(()),
        Some(owner) if caller.user_id() == Some(owner) => Ok(()),
        Some(_) => Err(AppError::Forbidden),
    }
}
