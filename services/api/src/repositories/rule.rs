//! Company rule repository

use chrono::Utc;
use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::CompanyRule;

fn rule_from_row(row: &PgRow) -> DatabaseResult<CompanyRule> {
    Ok(CompanyRule {
        rule_name: row.try_get("rule_name")?,
        details: row.try_get("details")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<CompanyRule>> {
        let rows = sqlx::query(
            "SELECT rule_name, details, created_by, created_at, updated_at \
             FROM company_rules ORDER BY rule_name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(rule_from_row).collect()
    }

    /// `rule_name -> details`, read inside the caller's transaction
    pub async fn load_map(&self, conn: &mut PgConnection) -> DatabaseResult<HashMap<String, String>> {
        let rows = sqlx::query("SELECT rule_name, details FROM company_rules")
            .fetch_all(conn)
            .await?;

        let mut rules = HashMap::with_capacity(rows.len());
        for row in rows {
            rules.insert(row.try_get("rule_name")?, row.try_get("details")?);
        }
        Ok(rules)
    }

    pub async fn upsert(
        &self,
        conn: &mut PgConnection,
        rule_name: &str,
        details: &str,
        created_by: Uuid,
    ) -> DatabaseResult<CompanyRule> {
        let row = sqlx::query(
            r#"
            INSERT INTO company_rules (rule_name, details, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (rule_name)
            DO UPDATE SET details = EXCLUDED.details, created_by = EXCLUDED.created_by,
                          updated_at = EXCLUDED.updated_at
            RETURNING rule_name, details, created_by, created_at, updated_at
            "#,
        )
        .bind(rule_name)
        .bind(details)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        rule_from_row(&row)
    }
}
