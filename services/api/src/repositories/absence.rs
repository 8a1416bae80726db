//! Absence repository

use chrono::NaiveDate;
use common::error::DatabaseResult;
use policy::absence::AbsenceFilter;
use policy::models::Absence;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;

const ABSENCE_COLUMNS: &str = "a.id, a.user_id, a.date, a.start_date, a.end_date, a.type, \
     a.reason, a.status, a.processed_by, a.processed_at, a.created_at, a.updated_at";

fn absence_from_row(row: &PgRow) -> DatabaseResult<Absence> {
    Ok(Absence {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        date: row.try_get("date")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        absence_type: parse_column(row, "type")?,
        reason: row.try_get("reason")?,
        status: parse_column(row, "status")?,
        processed_by: row.try_get("processed_by")?,
        processed_at: row.try_get("processed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct AbsenceRepository {
    pool: PgPool,
}

impl AbsenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, conn: &mut PgConnection, absence: &Absence) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO absences (id, user_id, date, start_date, end_date, type, reason,
                                  status, processed_by, processed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(absence.id)
        .bind(absence.user_id)
        .bind(absence.date)
        .bind(absence.start_date)
        .bind(absence.end_date)
        .bind(absence.absence_type.as_str())
        .bind(&absence.reason)
        .bind(absence.status.as_str())
        .bind(absence.processed_by)
        .bind(absence.processed_at)
        .bind(absence.created_at)
        .bind(absence.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DatabaseResult<Option<Absence>> {
        let sql = format!("SELECT {} FROM absences a WHERE a.id = $1 FOR UPDATE", ABSENCE_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;

        row.as_ref().map(absence_from_row).transpose()
    }

    /// Persist a status transition together with its processing stamp
    pub async fn update_status(&self, conn: &mut PgConnection, absence: &Absence) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE absences
            SET status = $2, processed_by = $3, processed_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(absence.id)
        .bind(absence.status.as_str())
        .bind(absence.processed_by)
        .bind(absence.processed_at)
        .bind(absence.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Absences of an employee whose range covers `date`
    pub async fn covering(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DatabaseResult<Vec<Absence>> {
        let sql = format!(
            "SELECT {} FROM absences a \
             WHERE a.user_id = $1 AND a.start_date <= $2 AND a.end_date >= $2",
            ABSENCE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_all(conn)
            .await?;

        rows.iter().map(absence_from_row).collect()
    }

    /// Filtered listing in insertion order; `owner` restricts to one employee
    pub async fn list(
        &self,
        filter: &AbsenceFilter,
        owner: Option<Uuid>,
    ) -> DatabaseResult<Vec<Absence>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM absences a JOIN employees e ON e.id = a.user_id WHERE TRUE",
            ABSENCE_COLUMNS
        ));

        if let Some(owner) = owner {
            query.push(" AND a.user_id = ").push_bind(owner);
        }
        if let Some(absence_type) = filter.absence_type {
            query.push(" AND a.type = ").push_bind(absence_type.as_str());
        }
        if let Some(status) = filter.status {
            query.push(" AND a.status = ").push_bind(status.as_str());
        }
        if let Some(department) = &filter.department {
            query.push(" AND e.department = ").push_bind(department);
        }
        if let Some(start) = filter.start_date {
            query.push(" AND a.date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND a.date <= ").push_bind(end);
        }
        query.push(" ORDER BY a.created_at, a.id");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(absence_from_row).collect()
    }
}
