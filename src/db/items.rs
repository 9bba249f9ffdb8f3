//! Template index over the `items` table. An item is a usage of the
//! template named by its `template_id` within the same database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::host::TemplateIndex;
use crate::model::{ItemId, ItemRecord};

impl super::Db {
    /// Insert or replace an item in the index.
    pub async fn register_item(&self, item: &ItemRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO items (database_name, id, name, parent_id, template_id, is_clone)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (database_name, id) DO UPDATE SET
                name = EXCLUDED.name,
                parent_id = EXCLUDED.parent_id,
                template_id = EXCLUDED.template_id,
                is_clone = EXCLUDED.is_clone",
        )
        .bind(&item.database)
        .bind(item.id.0)
        .bind(&item.name)
        .bind(item.parent_id.map(|p| p.0))
        .bind(item.template_id.map(|t| t.0))
        .bind(item.is_clone)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateIndex for super::Db {
    async fn item(&self, database: &str, id: ItemId) -> Result<Option<ItemRecord>> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT database_name, id, name, parent_id, template_id, is_clone
             FROM items WHERE database_name = $1 AND id = $2",
        )
        .bind(database)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ItemRow::into_record))
    }

    async fn usages_of(&self, database: &str, template_id: ItemId) -> Result<Vec<ItemId>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM items WHERE database_name = $1 AND template_id = $2 ORDER BY id",
        )
        .bind(database)
        .bind(template_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| ItemId(id)).collect())
    }

    async fn is_clone(&self, database: &str, id: ItemId) -> Result<bool> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT is_clone FROM items WHERE database_name = $1 AND id = $2")
                .bind(database)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some_and(|(clone,)| clone))
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    database_name: String,
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    template_id: Option<Uuid>,
    is_clone: bool,
}

impl ItemRow {
    fn into_record(self) -> ItemRecord {
        ItemRecord {
            database: self.database_name,
            id: ItemId(self.id),
            name: self.name,
            parent_id: self.parent_id.map(ItemId),
            template_id: self.template_id.map(ItemId),
            is_clone: self.is_clone,
        }
    }
}
