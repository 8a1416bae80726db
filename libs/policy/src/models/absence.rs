//! Absence model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::PolicyError;

/// What kind of deviation an absence records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    WithPermission,
    WithoutPermission,
    Resign,
    LateWithPermission,
    LateWithoutPermission,
    LeaveWithPermission,
    LeaveWithoutPermission,
}

/// Which part of the working day an absence covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    FullDay,
    Late,
    Leave,
    Resign,
}

/// Whether the deviation was authorised beforehand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    With,
    Without,
    NotApplicable,
}

impl AbsenceType {
    pub const ALL: [AbsenceType; 7] = [
        AbsenceType::WithPermission,
        AbsenceType::WithoutPermission,
        AbsenceType::Resign,
        AbsenceType::LateWithPermission,
        AbsenceType::LateWithoutPermission,
        AbsenceType::LeaveWithPermission,
        AbsenceType::LeaveWithoutPermission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceType::WithPermission => "with_permission",
            AbsenceType::WithoutPermission => "without_permission",
            AbsenceType::Resign => "resign",
            AbsenceType::LateWithPermission => "late_with_permission",
            AbsenceType::LateWithoutPermission => "late_without_permission",
            AbsenceType::LeaveWithPermission => "leave_with_permission",
            AbsenceType::LeaveWithoutPermission => "leave_without_permission",
        }
    }

    pub fn kind(&self) -> AbsenceKind {
        match self {
            AbsenceType::WithPermission | AbsenceType::WithoutPermission => AbsenceKind::FullDay,
            AbsenceType::LateWithPermission | AbsenceType::LateWithoutPermission => {
                AbsenceKind::Late
            }
            AbsenceType::LeaveWithPermission | AbsenceType::LeaveWithoutPermission => {
                AbsenceKind::Leave
            }
            AbsenceType::Resign => AbsenceKind::Resign,
        }
    }

    pub fn permission(&self) -> Permission {
        match self {
            AbsenceType::WithPermission
            | AbsenceType::LateWithPermission
            | AbsenceType::LeaveWithPermission => Permission::With,
            AbsenceType::WithoutPermission
            | AbsenceType::LateWithoutPermission
            | AbsenceType::LeaveWithoutPermission => Permission::Without,
            AbsenceType::Resign => Permission::NotApplicable,
        }
    }
}

impl fmt::Display for AbsenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsenceType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbsenceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PolicyError::validation(format!("Unknown absence type '{}'", s)))
    }
}

/// Approval state of an absence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl AbsenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "pending",
            AbsenceStatus::Approved => "approved",
            AbsenceStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected absences carry a processor
    pub fn is_processed(&self) -> bool {
        !matches!(self, AbsenceStatus::Pending)
    }
}

impl fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsenceStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AbsenceStatus::Pending),
            "approved" => Ok(AbsenceStatus::Approved),
            "rejected" => Ok(AbsenceStatus::Rejected),
            other => Err(PolicyError::validation(format!(
                "Unknown absence status '{}'",
                other
            ))),
        }
    }
}

/// Absence entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Absence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub absence_type: AbsenceType,
    pub reason: String,
    pub status: AbsenceStatus,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Absence {
    /// Whether the absence covers the given calendar day
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Absence creation payload; every field is optional so missing input can
/// be reported as a validation error rather than a parse failure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AbsenceDraft {
    pub user_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub absence_type: Option<AbsenceType>,
    pub reason: Option<String>,
}
