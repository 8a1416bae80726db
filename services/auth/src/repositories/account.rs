//! Login accounts backed by the employees table

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use policy::models::{EmployeeStatus, Role};
use serde::Serialize;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

/// The slice of an employee record needed to authenticate
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub nickname: String,
    pub email: Option<String>,
    pub role: Role,
    pub status: EmployeeStatus,
    #[serde(skip)]
    pub password_hash: Option<String>,
}

impl Account {
    /// Employees who left keep their record but lose access
    pub fn can_log_in(&self) -> bool {
        self.status != EmployeeStatus::LeftCompany
    }

    fn from_row(row: &PgRow) -> Result<Self> {
        Ok(Account {
            id: row.try_get("id")?,
            nickname: row.try_get("nickname")?,
            email: row.try_get("email")?,
            role: row.try_get::<String, _>("role")?.parse()?,
            status: row.try_get::<String, _>("status")?.parse()?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Compare a password with a stored argon2 hash
pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

const ACCOUNT_COLUMNS: &str = "id, nickname, email, role, status, password_hash";

/// Account repository
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM employees WHERE email = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Account::from_row).transpose()
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM employees WHERE nickname = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Account::from_row).transpose()
    }

    pub async fn root_exists(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employees WHERE role = 'root')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert the initial root account
    pub async fn create_root(&self, nickname: &str, email: &str, password: &str) -> Result<Account> {
        info!("Bootstrapping root account {}", nickname);

        let password_hash = hash_password(password)?;
        let sql = format!(
            r#"
            INSERT INTO employees (id, nickname, role, status, email, password_hash, onboard_date)
            VALUES ($1, $2, 'root', 'active', $3, $4, CURRENT_DATE)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(nickname)
            .bind(email)
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .await?;

        Account::from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "Secret123").unwrap());
        assert!(!verify_password(&hash, "secret123").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("plain-text", "whatever").is_err());
    }

    #[test]
    fn left_company_accounts_cannot_log_in() {
        let mut account = Account {
            id: Uuid::new_v4(),
            nickname: "former".to_string(),
            email: None,
            role: Role::Employee,
            status: EmployeeStatus::Active,
            password_hash: None,
        };
        assert!(account.can_log_in());
        account.status = EmployeeStatus::LeftCompany;
        assert!(!account.can_log_in());
    }
}
