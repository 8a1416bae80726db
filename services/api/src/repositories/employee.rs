//! Employee repository

use chrono::Utc;
use common::error::DatabaseResult;
use policy::models::Employee;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use super::parse_column;
use crate::models::EmployeeFilter;

const EMPLOYEE_COLUMNS: &str = "e.id, e.nickname, e.role, e.status, e.full_name, e.email, \
     e.phone_number, e.address, e.date_of_birth, e.gender, e.tax_id, e.health_insurance_id, \
     e.social_insurance_id, e.number_of_dependents, e.position, e.location, e.department, \
     e.wallet_address, e.salary, e.leave_balance, e.onboard_date, e.created_at, e.updated_at";

fn employee_from_row(row: &PgRow) -> DatabaseResult<Employee> {
    Ok(Employee {
        id: row.try_get("id")?,
        nickname: row.try_get("nickname")?,
        role: parse_column(row, "role")?,
        status: parse_column(row, "status")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        address: row.try_get("address")?,
        date_of_birth: row.try_get("date_of_birth")?,
        gender: row.try_get("gender")?,
        tax_id: row.try_get("tax_id")?,
        health_insurance_id: row.try_get("health_insurance_id")?,
        social_insurance_id: row.try_get("social_insurance_id")?,
        number_of_dependents: row.try_get("number_of_dependents")?,
        position: row.try_get("position")?,
        location: row.try_get("location")?,
        department: row.try_get("department")?,
        wallet_address: row.try_get("wallet_address")?,
        salary: row.try_get("salary")?,
        leave_balance: row.try_get("leave_balance")?,
        onboard_date: row.try_get("onboard_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Employee repository for database operations
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, conn: &mut PgConnection, employee: &Employee) -> DatabaseResult<()> {
        debug!("Inserting employee {}", employee.nickname);

        sqlx::query(
            r#"
            INSERT INTO employees (id, nickname, role, status, wallet_address, salary,
                                   onboard_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.nickname)
        .bind(employee.role.as_str())
        .bind(employee.status.as_str())
        .bind(&employee.wallet_address)
        .bind(employee.salary)
        .bind(employee.onboard_date)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees e WHERE e.id = $1", EMPLOYEE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(employee_from_row).transpose()
    }

    /// Load and lock a record for the rest of the transaction
    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DatabaseResult<Option<Employee>> {
        let sql = format!(
            "SELECT {} FROM employees e WHERE e.id = $1 FOR UPDATE",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;

        row.as_ref().map(employee_from_row).transpose()
    }

    /// Persist every mutable column of an employee
    pub async fn update(&self, conn: &mut PgConnection, employee: &Employee) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE employees SET
                nickname = $2, role = $3, status = $4, full_name = $5, email = $6,
                phone_number = $7, address = $8, date_of_birth = $9, gender = $10,
                tax_id = $11, health_insurance_id = $12, social_insurance_id = $13,
                number_of_dependents = $14, position = $15, location = $16,
                department = $17, wallet_address = $18, salary = $19, updated_at = $20
            WHERE id = $1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.nickname)
        .bind(employee.role.as_str())
        .bind(employee.status.as_str())
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.phone_number)
        .bind(&employee.address)
        .bind(employee.date_of_birth)
        .bind(&employee.gender)
        .bind(&employee.tax_id)
        .bind(&employee.health_insurance_id)
        .bind(&employee.social_insurance_id)
        .bind(employee.number_of_dependents)
        .bind(&employee.position)
        .bind(&employee.location)
        .bind(&employee.department)
        .bind(&employee.wallet_address)
        .bind(employee.salary)
        .bind(employee.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Mark an employee as gone after an approved resignation
    pub async fn mark_left(&self, conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE employees SET status = 'left_company', updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Ids of every employee who left the company
    pub async fn departed_ids(&self) -> DatabaseResult<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM employees WHERE status = 'left_company'")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    /// Filtered listing in creation order
    pub async fn list(&self, filter: &EmployeeFilter) -> DatabaseResult<Vec<Employee>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM employees e WHERE TRUE", EMPLOYEE_COLUMNS));

        if let Some(department) = &filter.department {
            query.push(" AND e.department = ").push_bind(department);
        }
        if let Some(status) = filter.status {
            query.push(" AND e.status = ").push_bind(status.as_str());
        }
        if let Some(absence_type) = filter.absence_type {
            query
                .push(" AND EXISTS (SELECT 1 FROM absences a WHERE a.user_id = e.id AND a.type = ")
                .push_bind(absence_type.as_str())
                .push(")");
        }
        if let Some(from) = filter.onboard_from {
            query.push(" AND e.onboard_date >= ").push_bind(from);
        }
        if let Some(to) = filter.onboard_to {
            query.push(" AND e.onboard_date <= ").push_bind(to);
        }
        query.push(" ORDER BY e.created_at, e.id");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(employee_from_row).collect()
    }

    /// Every employee, for reports
    pub async fn list_all(&self) -> DatabaseResult<Vec<Employee>> {
        self.list(&EmployeeFilter::default()).await
    }
}
