use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{CheckFn, EditFn, NewCatalogEntry, NewFreeformEntry, NutritionStore};
use crate::{
    error::AppError,
    nutrition::{
        Caller, CatalogEntry, CatalogItem, FreeformEntry, LoggedEntry, Nutrients, Profile,
    },
};

/// Catalog entry as stored: a reference to the item, joined on read.
#[derive(Debug, Clone)]
struct StoredCatalogEntry {
    id: Uuid,
    user_id: Option<Uuid>,
    item_id: Uuid,
    amount: f64,
    initial_amount: f64,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    items: HashMap<Uuid, CatalogItem>,
    catalog_entries: HashMap<Uuid, StoredCatalogEntry>,
    freeform_entries: HashMap<Uuid, FreeformEntry>,
    profiles: HashMap<Uuid, Profile>,
}

impl Tables {
    fn join(&self, stored: &StoredCatalogEntry) -> Result<CatalogEntry, AppError> {
        let item = self
            .items
            .get(&stored.item_id)
            .cloned()
            .ok_or(AppError::NotFound("product"))?;
        Ok(CatalogEntry {
            id: stored.id,
            user_id: stored.user_id,
            item,
            amount: stored.amount,
            initial_amount: stored.initial_amount,
            created_at: stored.created_at,
        })
    }

    fn find(&self, id: Uuid) -> Result<Option<LoggedEntry>, AppError> {
        if let Some(stored) = self.catalog_entries.get(&id) {
            return Ok(Some(LoggedEntry::Catalog(self.join(stored)?)));
        }
        Ok(self.freeform_entries.get(&id).cloned().map(LoggedEntry::Freeform))
    }
}

/// In-process store; one mutex stands in for row locks.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn find_entry(&self, id: Uuid) -> Result<Option<LoggedEntry>, AppError> {
        self.tables().find(id)
    }

    /// Replaces an item's baseline in place.
    pub fn set_baseline(&self, item_id: Uuid, per100: Nutrients) {
        if let Some(item) = self.tables().items.get_mut(&item_id) {
            item.per100 = per100;
        }
    }
}

#[async_trait]
impl NutritionStore for MemoryStore {
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>, AppError> {
        let mut items: Vec<CatalogItem> = self.tables().items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn catalog_item(&self, id: Uuid) -> Result<Option<CatalogItem>, AppError> {
        Ok(self.tables().items.get(&id).cloned())
    }

    async fn insert_catalog_item(
        &self,
        name: &str,
        per100: Nutrients,
    ) -> Result<CatalogItem, AppError> {
        let item = CatalogItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            per100,
        };
        self.tables().items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn insert_catalog_entry(&self, new: NewCatalogEntry) -> Result<CatalogEntry, AppError> {
        let mut tables = self.tables();
        let stored = StoredCatalogEntry {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            item_id: new.item_id,
            amount: new.amount,
            initial_amount: new.amount,
            created_at: new.created_at,
        };
        let entry = tables.join(&stored)?;
        tables.catalog_entries.insert(stored.id, stored);
        Ok(entry)
    }

    async fn insert_freeform_entry(
        &self,
        new: NewFreeformEntry,
    ) -> Result<FreeformEntry, AppError> {
        let entry = FreeformEntry {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            amount: new.resolved.amount,
            values: new.resolved.values,
            per100: new.resolved.per100,
            rates: new.resolved.rates,
            created_at: new.created_at,
        };
        self.tables().freeform_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, id: Uuid, edit: EditFn<'_>) -> Result<LoggedEntry, AppError> {
        let mut tables = self.tables();
        let current = tables.find(id)?.ok_or(AppError::NotFound("entry"))?;
        let updated = edit(current)?;
        match &updated {
            LoggedEntry::Catalog(e) => {
                if let Some(stored) = tables.catalog_entries.get_mut(&e.id) {
                    stored.amount = e.amount;
                }
            }
            LoggedEntry::Freeform(e) => {
                tables.freeform_entries.insert(e.id, e.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_entry(&self, id: Uuid, check: CheckFn<'_>) -> Result<LoggedEntry, AppError> {
        let mut tables = self.tables();
        let current = tables.find(id)?.ok_or(AppError::NotFound("entry"))?;
        check(&current)?;
        match &current {
            LoggedEntry::Catalog(_) => {
                tables.catalog_entries.remove(&id);
            }
            LoggedEntry::Freeform(_) => {
                tables.freeform_entries.remove(&id);
            }
        }
        Ok(current)
    }

    async fn entries_between(
        &self,
        scope: Caller,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<LoggedEntry>, AppError> {
        let tables = self.tables();
        let owner = scope.user_id();
        let in_window = |at: OffsetDateTime| at >= start && at < end;

        let mut out = Vec::new();
        for stored in tables.catalog_entries.values() {
            if stored.user_id == owner && in_window(stored.created_at) {
                out.push(LoggedEntry::Catalog(tables.join(stored)?));
            }
        }
        if owner.is_some() {
            out.extend(
                tables
                    .freeform_entries
                    .values()
                    .filter(|e| Some(e.user_id) == owner && in_window(e.created_at))
                    .cloned()
                    .map(LoggedEntry::Freeform),
            );
        }
        out.sort_by_key(|e| std::cmp::Reverse(e.created_at()));
        Ok(out)
    }

    async fn profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        Ok(self
            .tables()
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::empty(user_id))
            .clone())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        self.tables()
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{recompute, NutrientSource, PartialNutrients};
    use time::{macros::datetime, Duration};

    async fn seeded() -> (MemoryStore, CatalogItem) {
        let store = MemoryStore::new();
        let item = store
            .insert_catalog_item("Rice", Nutrients::new(130.0, 2.7, 0.3, 28.0))
            .await
            .expect("insert item");
        (store, item)
    }

    #[tokio::test]
    async fn catalog_entry_needs_existing_item() {
        let (store, _) = seeded().await;
        let err = store
            .insert_catalog_entry(NewCatalogEntry {
                user_id: None,
                item_id: Uuid::new_v4(),
                amount: 100.0,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .expect_err("unknown product");
        assert!(matches!(err, AppError::NotFound("product")));
    }

    #[tokio::test]
    async fn catalog_lookup_wins_over_freeform() {
        let (store, item) = seeded().await;
        let user = Uuid::new_v4();
        let entry = store
            .insert_catalog_entry(NewCatalogEntry {
                user_id: Some(user),
                item_id: item.id,
                amount: 200.0,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .expect("insert");

        let found = store.find_entry(entry.id).await.expect("find").expect("some");
        assert_eq!(found.id(), entry.id);
        assert!(matches!(found, LoggedEntry::Catalog(_)));
        assert_eq!(found.nutrients().kcal, 260.0);
    }

    #[tokio::test]
    async fn baseline_change_applies_to_existing_entries() {
        let (store, item) = seeded().await;
        let entry = store
            .insert_catalog_entry(NewCatalogEntry {
                user_id: None,
                item_id: item.id,
                amount: 50.0,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .expect("insert");

        store.set_baseline(item.id, Nutrients::new(200.0, 0.0, 0.0, 0.0));
        let found = store.find_entry(entry.id).await.expect("find").expect("some");
        assert_eq!(found.nutrients().kcal, 100.0);
    }

    #[tokio::test]
    async fn failed_edit_leaves_entry_untouched() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let resolved = recompute::resolve_freeform(
            100.0,
            PartialNutrients {
                kcal: Some(250.0),
                ..Default::default()
            },
            PartialNutrients::default(),
        )
        .expect("resolve");
        let entry = store
            .insert_freeform_entry(NewFreeformEntry {
                user_id: user,
                name: "Soup".into(),
                resolved,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .expect("insert");

        let err = store
            .update_entry(entry.id, &|_| Err(AppError::Forbidden))
            .await
            .expect_err("rejected");
        assert!(matches!(err, AppError::Forbidden));

        let found = store.find_entry(entry.id).await.expect("find").expect("some");
        assert_eq!(found, LoggedEntry::Freeform(entry));
    }

    #[tokio::test]
    async fn repeated_edits_keep_the_creation_rate() {
        let store = MemoryStore::new();
        let resolved = recompute::resolve_freeform(
            3.0,
            PartialNutrients {
                kcal: Some(1.0),
                ..Default::default()
            },
            PartialNutrients::default(),
        )
        .expect("resolve");
        let entry = store
            .insert_freeform_entry(NewFreeformEntry {
                user_id: Uuid::new_v4(),
                name: "Broth".into(),
                resolved,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .expect("insert");

        for amount in [1.0, 3.0, 1.0, 3.0] {
            store
                .update_entry(entry.id, &|e| Ok(recompute::apply_amount(e, amount)))
                .await
                .expect("edit");
        }
        let found = store.find_entry(entry.id).await.expect("find").expect("some");
        assert_eq!(found.nutrients().kcal, 1.0);
        assert_eq!(found, LoggedEntry::Freeform(entry));
    }

    #[tokio::test]
    async fn anonymous_scope_sees_only_public_entries() {
        let (store, item) = seeded().await;
        let user = Uuid::new_v4();
        let noon = datetime!(2024-06-01 12:00 UTC);
        for owner in [None, Some(user)] {
            store
                .insert_catalog_entry(NewCatalogEntry {
                    user_id: owner,
                    item_id: item.id,
                    amount: 100.0,
                    created_at: noon,
                })
                .await
                .expect("insert");
        }

        let start = noon - Duration::hours(12);
        let end = noon + Duration::hours(12);
        let public = store
            .entries_between(Caller::Anonymous, start, end)
            .await
            .expect("list");
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].owner(), None);

        let mine = store
            .entries_between(Caller::User(user), start, end)
            .await
            .expect("list");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner(), Some(user));

        let outside = store
            .entries_between(Caller::User(user), end, end + Duration::days(1))
            .await
            .expect("list");
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn profile_is_created_on_first_access() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let p = store.profile(user).await.expect("profile");
        assert_eq!(p, Profile::empty(user));
    }
}
