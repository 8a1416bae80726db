//! Attendance session repository

use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;
use policy::models::Attendance;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

const ATTENDANCE_COLUMNS: &str = "id, user_id, work_date, check_in_time, check_out_time, \
     expected_time, expected_check_out, on_time, created_at, updated_at";

fn attendance_from_row(row: &PgRow) -> DatabaseResult<Attendance> {
    Ok(Attendance {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        work_date: row.try_get("work_date")?,
        check_in_time: row.try_get("check_in_time")?,
        check_out_time: row.try_get("check_out_time")?,
        expected_time: row.try_get("expected_time")?,
        expected_check_out: row.try_get("expected_check_out")?,
        on_time: row.try_get("on_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Session of an employee for a local day, locked for the transaction
    /// Most recent session of an employee, locked for the caller's transaction
    pub async fn latest_for_update(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {} FROM attendances WHERE user_id = $1 \
             ORDER BY check_in_time DESC LIMIT 1 FOR UPDATE",
            ATTENDANCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

        row.as_ref().map(attendance_from_row).transpose()
    }

    /// Insert a new session; false when one already exists for the day or
    /// another one is still open
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        attendance: &Attendance,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendances (id, user_id, work_date, check_in_time, check_out_time,
                                     expected_time, expected_check_out, on_time,
                                     created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(attendance.id)
        .bind(attendance.user_id)
        .bind(attendance.work_date)
        .bind(attendance.check_in_time)
        .bind(attendance.check_out_time)
        .bind(attendance.expected_time)
        .bind(attendance.expected_check_out)
        .bind(attendance.on_time)
        .bind(attendance.created_at)
        .bind(attendance.updated_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn close(&self, conn: &mut PgConnection, attendance: &Attendance) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE attendances SET check_out_time = $2, updated_at = $3 \
             WHERE id = $1 AND check_out_time IS NULL",
        )
        .bind(attendance.id)
        .bind(attendance.check_out_time)
        .bind(attendance.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Sessions checked in within `[from, to]`, optionally for one employee
    pub async fn list_between(
        &self,
        user_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Attendance>> {
        let sql = format!(
            "SELECT {} FROM attendances \
             WHERE check_in_time BETWEEN $1 AND $2 AND ($3::uuid IS NULL OR user_id = $3) \
             ORDER BY check_in_time, id",
            ATTENDANCE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(from)
            .bind(to)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(attendance_from_row).collect()
    }
}
