//! Attendance session model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One work session: created at check-in, closed at check-out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Local calendar day the session belongs to
    pub work_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Scheduled check-in for the day
    pub expected_time: DateTime<Utc>,
    /// Scheduled check-out, when the company defines one
    pub expected_check_out: Option<DateTime<Utc>>,
    pub on_time: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}
