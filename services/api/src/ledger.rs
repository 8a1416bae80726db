//! Ledger notifications
//!
//! Salary and company rule changes are mirrored to an external ledger
//! canister. Events are written to the outbox in the same transaction as
//! the change that caused them and pushed after commit. A failed push stays
//! pending and is retried after the next successful push, or on demand
//! through `POST /ledger/flush`.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use sqlx::PgConnection;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::repositories::OutboxRepository;

/// Oldest pending notifications retried by one flush
const FLUSH_BATCH: i64 = 100;

/// Oldest pending notifications retried after a successful push
const RETRY_BATCH: i64 = 10;

/// Canister method call, serialized as `{"method": ..., "args": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum LedgerEvent {
    AddEmployee {
        wallet_address: String,
        salary: f64,
    },
    UpdateSalary {
        wallet_address: String,
        salary: f64,
    },
    UpdateCompanyRule {
        rule_id: String,
        details: String,
    },
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Ledger rejected the call with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Ledger event could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::ExternalNotification(err.to_string())
    }
}

/// HTTP client for the canister call endpoint
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    url: String,
}

impl LedgerClient {
    pub fn new(endpoint: &str, canister_id: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: call_url(endpoint, canister_id),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call(&self, event: &serde_json::Value) -> Result<(), LedgerError> {
        let response = self.client.post(&self.url).json(event).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected { status, body });
        }
        Ok(())
    }
}

fn call_url(endpoint: &str, canister_id: &str) -> String {
    format!(
        "{}/api/v2/canister/{}/call",
        endpoint.trim_end_matches('/'),
        canister_id
    )
}

/// Result of a manual retry
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Outbox writer and best-effort deliverer
#[derive(Clone)]
pub struct LedgerNotifier {
    client: Option<LedgerClient>,
    outbox: OutboxRepository,
}

impl LedgerNotifier {
    /// `client` is `None` when no canister is configured
    pub fn new(client: Option<LedgerClient>, outbox: OutboxRepository) -> Self {
        Self { client, outbox }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Record `event` inside the caller's transaction
    pub async fn enqueue(
        &self,
        conn: &mut PgConnection,
        event: &LedgerEvent,
    ) -> ApiResult<Option<Uuid>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let payload = serde_json::to_value(event).map_err(LedgerError::from)?;
        Ok(Some(self.outbox.enqueue(conn, &payload).await?))
    }

    /// Push a committed notification; `None` when there was nothing to push.
    ///
    /// Once the push succeeds, older pending notifications are retried too,
    /// stopping at the first one that fails again.
    pub async fn sync(&self, id: Option<Uuid>) -> Option<bool> {
        let id = id?;
        let delivered = self.deliver(id).await;
        if delivered {
            self.retry_pending().await;
        }
        Some(delivered)
    }

    async fn retry_pending(&self) {
        let pending = match self.outbox.pending(RETRY_BATCH).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Failed to load pending ledger notifications: {}", e);
                return;
            }
        };

        let mut delivered = 0;
        for entry in pending {
            if !self.deliver(entry.id).await {
                break;
            }
            delivered += 1;
        }
        if delivered > 0 {
            info!(delivered, "Retried pending ledger notifications");
        }
    }

    /// Push one pending notification, leaving it pending on failure
    pub async fn deliver(&self, id: Uuid) -> bool {
        let Some(client) = &self.client else {
            return false;
        };

        let entry = match self.outbox.find_pending(id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return true,
            Err(e) => {
                warn!("Failed to load ledger notification {}: {}", id, e);
                return false;
            }
        };

        match client.call(&entry.event).await {
            Ok(()) => {
                if let Err(e) = self.outbox.mark_delivered(id).await {
                    warn!("Ledger notification {} delivered but not marked: {}", id, e);
                }
                true
            }
            Err(e) => {
                warn!(attempts = entry.attempts + 1, "Ledger notification {} failed: {}", id, e);
                if let Err(e) = self.outbox.mark_failed(id, &e.to_string()).await {
                    warn!("Failed to record ledger failure for {}: {}", id, e);
                }
                false
            }
        }
    }

    /// Retry every pending notification, oldest first
    pub async fn flush(&self) -> ApiResult<FlushReport> {
        if !self.is_enabled() {
            return Err(ApiError::ExternalNotification(
                "No ledger canister is configured".to_string(),
            ));
        }

        let pending = self.outbox.pending(FLUSH_BATCH).await?;
        let mut report = FlushReport::default();
        for entry in pending {
            if self.deliver(entry.id).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            delivered = report.delivered,
            failed = report.failed,
            "Ledger flush finished"
        );
        if report.failed > 0 {
            return Err(ApiError::ExternalNotification(format!(
                "{} of {} notifications are still pending",
                report.failed,
                report.delivered + report.failed
            )));
        }
        Ok(report)
    }
}
