//! Absence workflow: creation, approval transitions and list filtering

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Absence, AbsenceDraft, AbsenceStatus, AbsenceType};
use crate::validation::parse_date;
use crate::{PolicyError, PolicyResult};

/// Validate a draft and build a pending absence.
///
/// `date` defaults to the current day and the covered range to `date`; an
/// explicit `date` must fall inside the covered range.
pub fn create(draft: AbsenceDraft, now: DateTime<Utc>) -> PolicyResult<Absence> {
    let user_id = draft
        .user_id
        .ok_or_else(|| PolicyError::validation("user_id is required"))?;
    let absence_type = draft
        .absence_type
        .ok_or_else(|| PolicyError::validation("type is required"))?;
    let reason = draft
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| PolicyError::validation("reason is required"))?;

    let date = draft
        .date
        .or(draft.start_date)
        .unwrap_or_else(|| now.date_naive());
    let start_date = draft.start_date.unwrap_or(date);
    let end_date = draft.end_date.unwrap_or(start_date.max(date));

    if start_date > end_date {
        return Err(PolicyError::validation(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    if date < start_date || date > end_date {
        return Err(PolicyError::validation(format!(
            "date {} is outside {}..{}",
            date, start_date, end_date
        )));
    }

    Ok(Absence {
        id: Uuid::new_v4(),
        user_id,
        date,
        start_date,
        end_date,
        absence_type,
        reason,
        status: AbsenceStatus::Pending,
        processed_by: None,
        processed_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// Move an absence to `status` on behalf of `processor`.
///
/// Processed absences are final: repeating the same decision by the same
/// processor returns the record unchanged, anything else is rejected.
/// Moving back to pending clears the processing stamp.
pub fn transition(
    absence: &Absence,
    status: AbsenceStatus,
    processor: Option<Uuid>,
    now: DateTime<Utc>,
) -> PolicyResult<Absence> {
    let mut next = absence.clone();

    if !status.is_processed() {
        next.status = AbsenceStatus::Pending;
        next.processed_by = None;
        next.processed_at = None;
        next.updated_at = now;
        return Ok(next);
    }

    let processor = processor.ok_or_else(|| {
        PolicyError::validation(format!("processed_by is required to mark an absence {}", status))
    })?;

    if absence.status.is_processed() {
        if absence.status == status && absence.processed_by == Some(processor) {
            return Ok(next);
        }
        return Err(PolicyError::validation(format!(
            "Absence {} was already {}",
            absence.id, absence.status
        )));
    }

    next.status = status;
    next.processed_by = Some(processor);
    next.processed_at = Some(absence.processed_at.unwrap_or(now));
    next.updated_at = now;
    Ok(next)
}

/// Raw listing query as it arrives on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbsenceQuery {
    #[serde(rename = "type")]
    pub absence_type: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Parsed listing filter; `None` means no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsenceFilter {
    pub absence_type: Option<AbsenceType>,
    pub status: Option<AbsenceStatus>,
    pub department: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AbsenceFilter {
    pub fn parse(query: &AbsenceQuery) -> PolicyResult<Self> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let date = |value: &Option<String>| {
            non_empty(value)
                .map(|v| parse_date(v).map_err(PolicyError::Validation))
                .transpose()
        };

        Ok(Self {
            absence_type: non_empty(&query.absence_type)
                .map(str::parse)
                .transpose()?,
            status: non_empty(&query.status).map(str::parse).transpose()?,
            department: non_empty(&query.department).map(str::to_string),
            start_date: date(&query.start_date)?,
            end_date: date(&query.end_date)?,
        })
    }

    /// Whether `absence`, owned by an employee in `department`, passes
    pub fn matches(&self, absence: &Absence, department: Option<&str>) -> bool {
        self.absence_type.is_none_or(|t| t == absence.absence_type)
            && self.status.is_none_or(|s| s == absence.status)
            && self
                .department
                .as_deref()
                .is_none_or(|d| department == Some(d))
            && self.start_date.is_none_or(|start| absence.date >= start)
            && self.end_date.is_none_or(|end| absence.date <= end)
    }
}
