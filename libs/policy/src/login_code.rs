//! Rotating shared login code
//!
//! A single code is active at a time. Root reads it (issuing one on first
//! access) and hands it out; an employee who logs in with it consumes it and
//! a fresh code replaces it.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

pub const CODE_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCode {
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl LoginCode {
    fn generate() -> Self {
        let code = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LENGTH)
            .map(char::from)
            .collect();
        Self {
            code,
            created_at: Utc::now(),
        }
    }
}

/// Process wide login code holder
#[derive(Debug, Default)]
pub struct AuthCodeStore {
    active: RwLock<Option<LoginCode>>,
}

impl AuthCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the active code, generating one when none exists
    pub async fn issue(&self) -> LoginCode {
        if let Some(active) = self.active.read().await.as_ref() {
            return active.clone();
        }

        let mut guard = self.active.write().await;
        // Another caller may have issued while we waited for the write lock
        guard.get_or_insert_with(LoginCode::generate).clone()
    }

    pub async fn current(&self) -> Option<LoginCode> {
        self.active.read().await.clone()
    }

    /// Replace the active code unconditionally
    pub async fn rotate(&self) -> LoginCode {
        let next = LoginCode::generate();
        *self.active.write().await = Some(next.clone());
        info!("Login code rotated");
        next
    }

    /// Consume `code`, returning the replacement when it matched
    pub async fn redeem(&self, code: &str) -> Option<LoginCode> {
        {
            let active = self.active.read().await;
            if !active.as_ref().is_some_and(|c| c.code == code) {
                return None;
            }
        }

        let mut guard = self.active.write().await;
        // Re-check: a concurrent redeem may have won the race
        if !guard.as_ref().is_some_and(|c| c.code == code) {
            return None;
        }
        let next = LoginCode::generate();
        *guard = Some(next.clone());
        info!("Login code redeemed and rotated");
        Some(next)
    }

    /// Whether `code` was the active code; rotates on success
    pub async fn validate(&self, code: &str) -> bool {
        self.redeem(code).await.is_some()
    }
}
