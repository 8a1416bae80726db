//! Violation model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    LateArrival,
    EarlyLeave,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::LateArrival => "late_arrival",
            ViolationType::EarlyLeave => "early_leave",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "late_arrival" => Ok(ViolationType::LateArrival),
            "early_leave" => Ok(ViolationType::EarlyLeave),
            other => Err(PolicyError::validation(format!(
                "Unknown violation type '{}'",
                other
            ))),
        }
    }
}

/// Penalty derived from a late arrival or an early leave
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub date: NaiveDate,
    pub minutes: i64,
    /// Fraction of pay withheld (0.05 per hour by default)
    pub deduction_amount: f64,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl Violation {
    /// Idempotency key: one violation per employee, day and type
    pub fn key(&self) -> (Uuid, NaiveDate, ViolationType) {
        (self.user_id, self.date, self.violation_type)
    }
}
