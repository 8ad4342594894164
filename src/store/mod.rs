use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::AppError,
    nutrition::{
        recompute::ResolvedFreeform, Caller, CatalogEntry, CatalogItem, FreeformEntry,
        LoggedEntry, Nutrients, Profile,
    },
};

#[cfg(test)]
pub mod memory;
pub mod postgres;
mod rows;

pub use postgres::PgStore;

/// Runs against the locked current state of an entry and returns the state to persist.
pub type EditFn<'a> = &'a (dyn Fn(LoggedEntry) -> Result<LoggedEntry, AppError> + Send + Sync);
/// Runs against the locked entry before it is deleted; an error aborts the delete.
pub type CheckFn<'a> = &'a (dyn Fn(&LoggedEntry) -> Result<(), AppError> + Send + Sync);

#[derive(Debug, Clone)]
pub struct NewCatalogEntry {
    pub user_id: Option<Uuid>,
    pub item_id: Uuid,
    pub amount: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFreeformEntry {
    pub user_id: Uuid,
    pub name: String,
    pub resolved: ResolvedFreeform,
    pub created_at: OffsetDateTime,
}

/// Persistence for the catalog, logged entries and profiles.
///
/// Catalog-linked and freeform entries share one identifier space; lookups try
/// catalog-linked entries first. `update_entry` and `delete_entry` must hold the
/// entry locked while the callback runs so both see a single snapshot.
#[async_trait]
pub trait NutritionStore: Send + Sync {
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>, AppError>;
    async fn catalog_item(&self, id: Uuid) -> Result<Option<CatalogItem>, AppError>;
    async fn insert_catalog_item(&self, name: &str, per100: Nutrients)
        -> Result<CatalogItem, AppError>;

    /// Fails with `NotFound` when the referenced catalog item does not exist.
    async fn insert_catalog_entry(&self, new: NewCatalogEntry) -> Result<CatalogEntry, AppError>;
    async fn insert_freeform_entry(&self, new: NewFreeformEntry)
        -> Result<FreeformEntry, AppError>;
    async fn update_entry(&self, id: Uuid, edit: EditFn<'_>) -> Result<LoggedEntry, AppError>;
    async fn delete_entry(&self, id: Uuid, check: CheckFn<'_>) -> Result<LoggedEntry, AppError>;
    /// Entries of `scope` created in `[start, end)`, newest first. The anonymous
    /// scope sees public catalog-linked entries only.
    async fn entries_between(
        &self,
        scope: Caller,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<LoggedEntry>, AppError>;

    /// Returns the user's profile, creating an empty one on first access.
    async fn profile(&self, user_id: Uuid) -> Result<Profile, AppError>;
    async fn save_profile(&self, profile: &Profile) -> Result<Profile, AppError>;
}
