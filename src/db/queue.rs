//! Publish-queue rows. Dedupe is enforced by the table's unique key, so
//! repeated inserts of the same entry are no-ops.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::host::PublishQueueStore;
use crate::model::{ItemId, LanguageScope, QueueEntry, QueuedEntry};

const INSERT_ENTRY: &str = "INSERT INTO publish_queue (database_name, item_id, language, action, action_date)
     VALUES ($1, $2, $3, $4, $5)
     ON CONFLICT (database_name, item_id, language, action, action_date) DO NOTHING";

impl super::Db {
    /// Most recent queue rows first.
    pub async fn list_queue(&self, limit: i64) -> Result<Vec<QueuedEntry>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            "SELECT id, database_name, item_id, language, action, action_date, created_at
             FROM publish_queue ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueueRow::try_into_entry).collect()
    }
}

#[async_trait]
impl PublishQueueStore for super::Db {
    async fn add_to_publish_queue(&self, entry: &QueueEntry) -> Result<bool> {
        let rows_affected = bind_entry(sqlx::query(INSERT_ENTRY), entry)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected == 1)
    }

    async fn add_batch(&self, entries: &[QueueEntry]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for entry in entries {
            created += bind_entry(sqlx::query(INSERT_ENTRY), entry)
                .execute(&mut *tx)
                .await?
                .rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(created)
    }
}

fn bind_entry<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    entry: &'q QueueEntry,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&entry.database)
        .bind(entry.item_id.0)
        .bind(entry.language.as_storage_str())
        .bind(entry.action.to_string())
        .bind(entry.timestamp)
}

#[derive(sqlx::FromRow)]
struct QueueRow {
    id: i64,
    database_name: String,
    item_id: Uuid,
    language: String,
    action: String,
    action_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl QueueRow {
    fn try_into_entry(self) -> Result<QueuedEntry> {
        Ok(QueuedEntry {
            id: self.id,
            entry: QueueEntry {
                database: self.database_name,
                item_id: ItemId(self.item_id),
                action: self.action.parse()?,
                timestamp: self.action_date,
                language: LanguageScope::from_storage_str(&self.language)?,
            },
            created_at: self.created_at,
        })
    }
}
