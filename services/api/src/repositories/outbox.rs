//! Ledger outbox: notifications committed with the write that caused them

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use serde_json::Value;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// Pending notification
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub id: Uuid,
    /// `{"method": ..., "args": {...}}`
    pub event: Value,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

fn entry_from_row(row: &PgRow) -> DatabaseResult<OutboxEntry> {
    Ok(OutboxEntry {
        id: row.try_get("id")?,
        event: row.try_get("event")?,
        attempts: row.try_get("attempts")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, conn: &mut PgConnection, event: &Value) -> DatabaseResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO ledger_outbox (id, event, created_at) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(event)
            .bind(Utc::now())
            .execute(conn)
            .await?;
        Ok(id)
    }

    pub async fn find_pending(&self, id: Uuid) -> DatabaseResult<Option<OutboxEntry>> {
        let row = sqlx::query(
            "SELECT id, event, attempts, created_at FROM ledger_outbox \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    /// Oldest pending notifications first
    pub async fn pending(&self, limit: i64) -> DatabaseResult<Vec<OutboxEntry>> {
        let rows = sqlx::query(
            "SELECT id, event, attempts, created_at FROM ledger_outbox \
             WHERE status = 'pending' ORDER BY created_at, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    pub async fn mark_delivered(&self, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE ledger_outbox SET status = 'delivered', attempts = attempts + 1, \
             last_error = NULL, delivered_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, id: Uuid, error: &str) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE ledger_outbox SET attempts = attempts + 1, last_error = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
