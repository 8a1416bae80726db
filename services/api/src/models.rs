//! API models for request and response payloads

use chrono::{DateTime, NaiveDate, Utc};
use policy::models::{AbsenceStatus, AbsenceType, EmployeeStatus};
use policy::report::ReportRange;
use policy::validation::parse_date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Envelope of every API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

/// A record written locally together with the state of its ledger notification
#[derive(Debug, Serialize)]
pub struct Synced<T: Serialize> {
    #[serde(flatten)]
    pub record: T,
    /// `None` when the write produced no ledger event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_synced: Option<bool>,
}

/// Query for `GET /employees`
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeListQuery {
    pub department: Option<String>,
    pub status: Option<String>,
    pub absence_type: Option<String>,
    pub onboard_from: Option<String>,
    pub onboard_to: Option<String>,
}

/// Parsed employee listing filter
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    /// Employees with at least one absence of this type
    pub absence_type: Option<AbsenceType>,
    pub onboard_from: Option<NaiveDate>,
    pub onboard_to: Option<NaiveDate>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn optional_date(value: &Option<String>) -> ApiResult<Option<NaiveDate>> {
    non_empty(value)
        .map(|v| parse_date(v).map_err(ApiError::Validation))
        .transpose()
}

impl TryFrom<&EmployeeListQuery> for EmployeeFilter {
    type Error = ApiError;

    fn try_from(query: &EmployeeListQuery) -> ApiResult<Self> {
        Ok(Self {
            department: non_empty(&query.department).map(str::to_string),
            status: non_empty(&query.status).map(str::parse).transpose()?,
            absence_type: non_empty(&query.absence_type)
                .map(str::parse)
                .transpose()?,
            onboard_from: optional_date(&query.onboard_from)?,
            onboard_to: optional_date(&query.onboard_to)?,
        })
    }
}

/// Query for per-employee listings (`/attendance`, `/violations`, `/salary`)
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    /// Another employee's records; needs a privileged role
    pub user_id: Option<Uuid>,
    pub range: Option<String>,
}

impl RecordQuery {
    pub fn range(&self) -> ApiResult<ReportRange> {
        parse_range(self.range.as_deref())
    }
}

/// Query for `/reports/*`
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub range: Option<String>,
    pub top: Option<usize>,
}

pub const DEFAULT_TOP: usize = 10;

impl ReportQuery {
    pub fn range(&self) -> ApiResult<ReportRange> {
        parse_range(self.range.as_deref())
    }

    pub fn top(&self) -> usize {
        self.top.unwrap_or(DEFAULT_TOP)
    }
}

/// Month when no range is given
fn parse_range(range: Option<&str>) -> ApiResult<ReportRange> {
    match range.map(str::trim).filter(|r| !r.is_empty()) {
        Some(range) => Ok(range.parse()?),
        None => Ok(ReportRange::Month),
    }
}

/// Body of `PATCH /absences/:id/status`
#[derive(Debug, Deserialize)]
pub struct AbsenceStatusRequest {
    pub status: AbsenceStatus,
}

/// Body of `PUT /rules/:name`
#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub details: String,
}

/// Company-wide setting such as the scheduled check-in time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompanyRule {
    pub rule_name: String,
    pub details: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_query_parses_into_a_filter() {
        let query = EmployeeListQuery {
            department: Some("IT".to_string()),
            status: Some("active".to_string()),
            absence_type: Some("with_permission".to_string()),
            onboard_from: Some("2024-01-01".to_string()),
            onboard_to: Some(" ".to_string()),
        };
        let filter = EmployeeFilter::try_from(&query).unwrap();
        assert_eq!(filter.department.as_deref(), Some("IT"));
        assert_eq!(filter.status, Some(EmployeeStatus::Active));
        assert_eq!(filter.absence_type, Some(AbsenceType::WithPermission));
        assert_eq!(filter.onboard_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.onboard_to, None);
    }

    #[test]
    fn malformed_filters_are_validation_errors() {
        let bad_date = EmployeeListQuery {
            onboard_from: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            EmployeeFilter::try_from(&bad_date),
            Err(ApiError::Validation(_))
        ));

        let bad_status = EmployeeListQuery {
            status: Some("retired".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            EmployeeFilter::try_from(&bad_status),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn range_defaults_to_month_and_rejects_unknown_windows() {
        assert_eq!(ReportQuery::default().range().unwrap(), ReportRange::Month);
        let query = ReportQuery {
            range: Some("fortnight".to_string()),
            top: None,
        };
        assert!(matches!(query.range(), Err(ApiError::InvalidRange(_))));
        assert_eq!(query.top(), DEFAULT_TOP);
    }

    #[test]
    fn envelope_omits_empty_members() {
        let json = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 1}));

        let synced = Synced {
            record: serde_json::json!({"id": 7}),
            ledger_synced: Some(false),
        };
        let json = serde_json::to_value(ApiResponse::with_message("Created", synced)).unwrap();
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["data"]["ledger_synced"], false);
        assert_eq!(json["message"], "Created");
    }
}
