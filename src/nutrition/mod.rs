//! Nutrition domain: entries, the recompute rule, aggregation and the daily
//! recommendation. Nothing in here touches storage or HTTP.

pub mod aggregate;
pub mod entry;
pub mod nutrients;
pub mod profile;
pub mod recommendation;
pub mod recompute;

pub use entry::{
    ensure_can_mutate, Caller, CatalogEntry, CatalogItem, EntryKind, FreeformEntry, LoggedEntry,
    PartialNutrients,
};
pub use nutrients::{NutrientSource, Nutrients};
pub use profile::Profile;
