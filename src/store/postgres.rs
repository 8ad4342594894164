use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    rows::{CatalogEntryRow, CatalogItemRow, FreeformEntryRow, ProfileRow},
    CheckFn, EditFn, NewCatalogEntry, NewFreeformEntry, NutritionStore,
};
use crate::{
    error::AppError,
    nutrition::{
        Caller, CatalogEntry, CatalogItem, FreeformEntry, LoggedEntry, Nutrients, Profile,
    },
};

const CATALOG_ENTRY_COLUMNS: &str = r#"
    e.id, e.user_id, e.amount, e.initial_amount, e.created_at,
    i.id AS item_id, i.name AS item_name,
    i.kcal_per100, i.protein_per100, i.fat_per100, i.carbs_per100
"#;

const FREEFORM_COLUMNS: &str = r#"
    id, user_id, name, amount, kcal, protein, fat, carbs,
    kcal_per100, protein_per100, fat_per100, carbs_per100,
    kcal_rate, protein_rate, fat_rate, carbs_rate, created_at
"#;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Locks the entry row (catalog-linked first) for the rest of the transaction.
async fn lock_entry(conn: &mut PgConnection, id: Uuid) -> anyhow::Result<Option<LoggedEntry>> {
    let catalog = sqlx::query_as::<_, CatalogEntryRow>(&format!(
        r#"
        SELECT {CATALOG_ENTRY_COLUMNS}
          FROM catalog_entries e
          JOIN catalog_items i ON i.id = e.item_id
         WHERE e.id = $1
           FOR UPDATE OF e
        "#
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .context("lock catalog entry")?;
    if let Some(row) = catalog {
        return Ok(Some(LoggedEntry::Catalog(row.into())));
    }

    let freeform = sqlx::query_as::<_, FreeformEntryRow>(&format!(
        r#"
        SELECT {FREEFORM_COLUMNS}
          FROM freeform_entries
         WHERE id = $1
           FOR UPDATE
        "#
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .context("lock freeform entry")?;
    Ok(freeform.map(|row| LoggedEntry::Freeform(row.into())))
}

#[async_trait]
impl NutritionStore for PgStore {
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>, AppError> {
        let rows = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            SELECT id, name, kcal_per100, protein_per100, fat_per100, carbs_per100
              FROM catalog_items
             ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list catalog")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn catalog_item(&self, id: Uuid) -> Result<Option<CatalogItem>, AppError> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            SELECT id, name, kcal_per100, protein_per100, fat_per100, carbs_per100
              FROM catalog_items
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get catalog item")?;
        Ok(row.map(Into::into))
    }

    async fn insert_catalog_item(
        &self,
        name: &str,
        per100: Nutrients,
    ) -> Result<CatalogItem, AppError> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            INSERT INTO catalog_items (id, name, kcal_per100, protein_per100, fat_per100, carbs_per100)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, kcal_per100, protein_per100, fat_per100, carbs_per100
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(per100.kcal)
        .bind(per100.protein)
        .bind(per100.fat)
        .bind(per100.carbs)
        .fetch_one(&self.db)
        .await
        .context("insert catalog item")?;
        Ok(row.into())
    }

    async fn insert_catalog_entry(&self, new: NewCatalogEntry) -> Result<CatalogEntry, AppError> {
        let item = self
            .catalog_item(new.item_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO catalog_entries (id, user_id, item_id, amount, initial_amount, created_at)
            VALUES ($1, $2, $3, $4, $4, $5)
            "#,
        )
        .bind(id)
        .bind(new.user_id)
        .bind(item.id)
        .bind(new.amount)
        .bind(new.created_at)
        .execute(&self.db)
        .await
        .context("insert catalog entry")?;

        Ok(CatalogEntry {
            id,
            user_id: new.user_id,
            item,
            amount: new.amount,
            initial_amount: new.amount,
            created_at: new.created_at,
        })
    }

    async fn insert_freeform_entry(
        &self,
        new: NewFreeformEntry,
    ) -> Result<FreeformEntry, AppError> {
        let r = &new.resolved;
        let row = sqlx::query_as::<_, FreeformEntryRow>(&format!(
            r#"
            INSERT INTO freeform_entries
                (id, user_id, name, amount, kcal, protein, fat, carbs,
                 kcal_per100, protein_per100, fat_per100, carbs_per100,
                 kcal_rate, protein_rate, fat_rate, carbs_rate, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {FREEFORM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.name)
        .bind(r.amount)
        .bind(r.values.kcal)
        .bind(r.values.protein)
        .bind(r.values.fat)
        .bind(r.values.carbs)
        .bind(r.per100.kcal)
        .bind(r.per100.protein)
        .bind(r.per100.fat)
        .bind(r.per100.carbs)
        .bind(r.rates.kcal)
        .bind(r.rates.protein)
        .bind(r.rates.fat)
        .bind(r.rates.carbs)
        .bind(new.created_at)
        .fetch_one(&self.db)
        .await
        .context("insert freeform entry")?;
        Ok(row.into())
    }

    async fn update_entry(&self, id: Uuid, edit: EditFn<'_>) -> Result<LoggedEntry, AppError> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let current = lock_entry(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("entry"))?;
        let updated = edit(current)?;

        match &updated {
            LoggedEntry::Catalog(e) => {
                sqlx::query("UPDATE catalog_entries SET amount = $2 WHERE id = $1")
                    .bind(e.id)
                    .bind(e.amount)
                    .execute(&mut *tx)
                    .await
                    .context("update catalog entry")?;
            }
            LoggedEntry::Freeform(e) => {
                sqlx::query(
                    r#"
                    UPDATE freeform_entries
                       SET amount = $2, kcal = $3, protein = $4, fat = $5, carbs = $6
                     WHERE id = $1
                    "#,
                )
                .bind(e.id)
                .bind(e.amount)
                .bind(e.values.kcal)
                .bind(e.values.protein)
                .bind(e.values.fat)
                .bind(e.values.carbs)
                .execute(&mut *tx)
                .await
                .context("update freeform entry")?;
            }
        }

        tx.commit().await.context("commit tx")?;
        Ok(updated)
    }

    async fn delete_entry(&self, id: Uuid, check: CheckFn<'_>) -> Result<LoggedEntry, AppError> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let current = lock_entry(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("entry"))?;
        check(&current)?;

        let sql = match current {
            LoggedEntry::Catalog(_) => "DELETE FROM catalog_entries WHERE id = $1",
            LoggedEntry::Freeform(_) => "DELETE FROM freeform_entries WHERE id = $1",
        };
        sqlx::query(sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete entry")?;

        tx.commit().await.context("commit tx")?;
        Ok(current)
    }

    async fn entries_between(
        &self,
        scope: Caller,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<LoggedEntry>, AppError> {
        let owner = scope.user_id();
        let catalog = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            r#"
            SELECT {CATALOG_ENTRY_COLUMNS}
              FROM catalog_entries e
              JOIN catalog_items i ON i.id = e.item_id
             WHERE e.user_id IS NOT DISTINCT FROM $1
               AND e.created_at >= $2 AND e.created_at < $3
            "#
        ))
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .context("list catalog entries")?;

        let mut entries: Vec<LoggedEntry> = catalog
            .into_iter()
            .map(|row| LoggedEntry::Catalog(row.into()))
            .collect();

        if let Some(user_id) = owner {
            let freeform = sqlx::query_as::<_, FreeformEntryRow>(&format!(
                r#"
                SELECT {FREEFORM_COLUMNS}
                  FROM freeform_entries
                 WHERE user_id = $1
                   AND created_at >= $2 AND created_at < $3
                "#
            ))
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await
            .context("list freeform entries")?;
            entries.extend(freeform.into_iter().map(|row| LoggedEntry::Freeform(row.into())));
        }

        entries.sort_by_key(|e| std::cmp::Reverse(e.created_at()));
        Ok(entries)
    }

    async fn profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, age, sex, weight_kg, height_cm, activity_level, goal
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("get or create profile")?;
        Ok(row.into())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        let age = profile.age.map(i32::try_from).transpose().context("age out of range")?;
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (user_id, age, sex, weight_kg, height_cm, activity_level, goal)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
               SET age = EXCLUDED.age,
                   sex = EXCLUDED.sex,
                   weight_kg = EXCLUDED.weight_kg,
                   height_cm = EXCLUDED.height_cm,
                   activity_level = EXCLUDED.activity_level,
                   goal = EXCLUDED.goal
            RETURNING user_id, age, sex, weight_kg, height_cm, activity_level, goal
            "#,
        )
        .bind(profile.user_id)
        .bind(age)
        .bind(profile.sex.map(|s| s.code()))
        .bind(profile.weight_kg)
        .bind(profile.height_cm)
        .bind(profile.activity.map(|a| a.code()))
        .bind(profile.goal.map(|g| g.code()))
        .fetch_one(&self.db)
        .await
        .context("save profile")?;
        Ok(row.into())
    }
}
