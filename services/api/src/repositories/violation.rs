//! Violation repository

use chrono::NaiveDate;
use common::error::DatabaseResult;
use policy::models::Violation;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;

const VIOLATION_COLUMNS: &str =
    "id, user_id, type, date, minutes, deduction_amount, details, created_at";

fn violation_from_row(row: &PgRow) -> DatabaseResult<Violation> {
    Ok(Violation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        violation_type: parse_column(row, "type")?,
        date: row.try_get("date")?,
        minutes: row.try_get("minutes")?,
        deduction_amount: row.try_get("deduction_amount")?,
        details: row.try_get("details")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct ViolationRepository {
    pool: PgPool,
}

impl ViolationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a violation once per employee, day and type.
    ///
    /// Returns false when the same violation was already stored.
    pub async fn insert(&self, conn: &mut PgConnection, violation: &Violation) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO violations (id, user_id, type, date, minutes, deduction_amount,
                                    details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, date, type) DO NOTHING
            "#,
        )
        .bind(violation.id)
        .bind(violation.user_id)
        .bind(violation.violation_type.as_str())
        .bind(violation.date)
        .bind(violation.minutes)
        .bind(violation.deduction_amount)
        .bind(&violation.details)
        .bind(violation.created_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn for_day(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DatabaseResult<Vec<Violation>> {
        let sql = format!(
            "SELECT {} FROM violations WHERE user_id = $1 AND date = $2",
            VIOLATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_all(conn)
            .await?;

        rows.iter().map(violation_from_row).collect()
    }

    /// Violations dated within `[from, to]`, optionally for one employee
    pub async fn list_between(
        &self,
        user_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DatabaseResult<Vec<Violation>> {
        let sql = format!(
            "SELECT {} FROM violations \
             WHERE date BETWEEN $1 AND $2 AND ($3::uuid IS NULL OR user_id = $3) \
             ORDER BY date, created_at, id",
            VIOLATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(from)
            .bind(to)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(violation_from_row).collect()
    }
}
