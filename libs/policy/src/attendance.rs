//! Attendance evaluation
//!
//! Decides whether a check-in is late or a check-out early against the
//! company schedule, derives the violation and deduction for it, and
//! produces the pending absence that documents an unexcused deviation.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::absence;
use crate::models::{
    Absence, AbsenceDraft, AbsenceStatus, AbsenceType, Attendance, Violation, ViolationType,
};
use crate::validation::parse_clock_time;
use crate::{PolicyError, PolicyResult};

/// Rule holding the scheduled check-in (`HH:MM`)
pub const CHECK_IN_RULE: &str = "check_in_time";
/// Rule holding the scheduled check-out (`HH:MM`), optional
pub const CHECK_OUT_RULE: &str = "check_out_time";
/// Rule holding the deduction per hour of deviation, optional
pub const DEDUCTION_RATE_RULE: &str = "deduction_rate";
/// Fraction of pay withheld per hour late or early
pub const DEFAULT_DEDUCTION_RATE: f64 = 0.05;

/// Company working schedule resolved from the rule table
#[derive(Debug, Clone, PartialEq)]
pub struct WorkSchedule {
    pub check_in: NaiveTime,
    pub check_out: Option<NaiveTime>,
    pub deduction_rate: f64,
    pub offset: FixedOffset,
}

impl WorkSchedule {
    /// Build the schedule from `rule_name -> details` pairs
    pub fn from_rules(rules: &HashMap<String, String>, offset: FixedOffset) -> PolicyResult<Self> {
        let check_in = rules
            .get(CHECK_IN_RULE)
            .ok_or_else(|| {
                PolicyError::Configuration(format!("rule '{}' is not defined", CHECK_IN_RULE))
            })
            .and_then(|value| parse_clock_time(value).map_err(PolicyError::Configuration))?;

        let check_out = rules
            .get(CHECK_OUT_RULE)
            .map(|value| parse_clock_time(value).map_err(PolicyError::Configuration))
            .transpose()?;

        let deduction_rate = match rules.get(DEDUCTION_RATE_RULE) {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .ok_or_else(|| {
                    PolicyError::Configuration(format!(
                        "rule '{}' must be a non-negative decimal, got '{}'",
                        DEDUCTION_RATE_RULE, value
                    ))
                })?,
            None => DEFAULT_DEDUCTION_RATE,
        };

        Ok(Self {
            check_in,
            check_out,
            deduction_rate,
            offset,
        })
    }

    /// Calendar day of an instant in company local time
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Scheduled check-in for a local day
    pub fn expected_check_in(&self, date: NaiveDate) -> PolicyResult<DateTime<Utc>> {
        self.at_local(date, self.check_in)
    }

    /// Scheduled check-out for a local day, if the company defines one
    pub fn expected_check_out(&self, date: NaiveDate) -> PolicyResult<Option<DateTime<Utc>>> {
        self.check_out
            .map(|time| self.at_local(date, time))
            .transpose()
    }

    fn at_local(&self, date: NaiveDate, time: NaiveTime) -> PolicyResult<DateTime<Utc>> {
        date.and_time(time)
            .and_local_timezone(self.offset)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                PolicyError::Configuration(format!("{} {} has no single local instant", date, time))
            })
    }
}

/// Result of comparing a check-in with the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Punctuality {
    pub on_time: bool,
    pub lateness: Duration,
}

/// Result of comparing a check-out with the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyLeave {
    pub early: bool,
    pub early_by: Duration,
}

pub fn evaluate_check_in(check_in: DateTime<Utc>, expected: DateTime<Utc>) -> Punctuality {
    let lateness = (check_in - expected).max(Duration::zero());
    Punctuality {
        on_time: lateness.is_zero(),
        lateness,
    }
}

/// Without a scheduled check-out nobody leaves early
pub fn evaluate_check_out(check_out: DateTime<Utc>, expected: Option<DateTime<Utc>>) -> EarlyLeave {
    let early_by = expected
        .map(|expected| (expected - check_out).max(Duration::zero()))
        .unwrap_or_else(Duration::zero);
    EarlyLeave {
        early: !early_by.is_zero(),
        early_by,
    }
}

/// Deduction fraction for a deviation: hours times the hourly rate
pub fn deduction(deviation: Duration, rate: f64) -> f64 {
    deviation.num_seconds() as f64 / 3600.0 * rate
}

/// What a check-in produces
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInOutcome {
    pub attendance: Attendance,
    pub punctuality: Punctuality,
    pub violation: Option<Violation>,
    pub absence: Option<Absence>,
}

/// What a check-out produces
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutOutcome {
    pub attendance: Attendance,
    pub early_leave: EarlyLeave,
    pub violation: Option<Violation>,
    pub absence: Option<Absence>,
}

/// Records already stored for the employee and day being evaluated
#[derive(Debug, Clone, Copy, Default)]
pub struct DayRecords<'a> {
    pub violations: &'a [Violation],
    pub absences: &'a [Absence],
}

/// Open a session for `user_id` at `now`.
///
/// `latest` is the employee's most recent session. It blocks the check-in
/// while it is still open, whatever day it started on, and when it already
/// covers the local day.
pub fn check_in(
    schedule: &WorkSchedule,
    user_id: Uuid,
    latest: Option<&Attendance>,
    day: DayRecords<'_>,
    now: DateTime<Utc>,
) -> PolicyResult<CheckInOutcome> {
    let work_date = schedule.local_date(now);
    if let Some(latest) = latest {
        if latest.is_open() || latest.work_date == work_date {
            return Err(PolicyError::DuplicateSession {
                user_id,
                date: latest.work_date,
            });
        }
    }

    let expected_time = schedule.expected_check_in(work_date)?;
    let expected_check_out = schedule.expected_check_out(work_date)?;
    let punctuality = evaluate_check_in(now, expected_time);

    let attendance = Attendance {
        id: Uuid::new_v4(),
        user_id,
        work_date,
        check_in_time: now,
        check_out_time: None,
        expected_time,
        expected_check_out,
        on_time: punctuality.on_time,
        created_at: now,
        updated_at: now,
    };

    let (violation, absence) = if punctuality.on_time {
        (None, None)
    } else {
        let minutes = punctuality.lateness.num_minutes();
        debug!(%user_id, %work_date, minutes, "Late check-in");
        let details = format!(
            "Checked in {} minutes after the scheduled {}",
            minutes,
            schedule.check_in.format("%H:%M")
        );
        penalize(
            schedule,
            user_id,
            work_date,
            ViolationType::LateArrival,
            punctuality.lateness,
            details,
            day,
            now,
        )?
    };

    Ok(CheckInOutcome {
        attendance,
        punctuality,
        violation,
        absence,
    })
}

/// Close the employee's open session.
///
/// `latest` is the most recent session; an open one is closed even when it
/// started on an earlier local day. `day` holds the records of the day the
/// session belongs to.
pub fn check_out(
    schedule: &WorkSchedule,
    user_id: Uuid,
    latest: Option<Attendance>,
    day: DayRecords<'_>,
    now: DateTime<Utc>,
) -> PolicyResult<CheckOutOutcome> {
    let today = schedule.local_date(now);
    let mut attendance = match latest {
        Some(session) if session.is_open() => session,
        Some(session) if session.work_date == today => {
            return Err(PolicyError::validation(format!(
                "Already checked out on {}",
                session.work_date
            )));
        }
        _ => {
            return Err(PolicyError::NotFound(format!(
                "No open check-in for {}",
                today
            )));
        }
    };
    let work_date = attendance.work_date;

    let early_leave = evaluate_check_out(now, attendance.expected_check_out);
    attendance.check_out_time = Some(now);
    attendance.updated_at = now;

    let (violation, absence) = if early_leave.early {
        let minutes = early_leave.early_by.num_minutes();
        debug!(%user_id, %work_date, minutes, "Early check-out");
        let scheduled = schedule
            .check_out
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();
        let details = format!(
            "Checked out {} minutes before the scheduled {}",
            minutes, scheduled
        );
        penalize(
            schedule,
            user_id,
            attendance.work_date,
            ViolationType::EarlyLeave,
            early_leave.early_by,
            details,
            day,
            now,
        )?
    } else {
        (None, None)
    };

    Ok(CheckOutOutcome {
        attendance,
        early_leave,
        violation,
        absence,
    })
}

#[allow(clippy::too_many_arguments)]
fn penalize(
    schedule: &WorkSchedule,
    user_id: Uuid,
    date: NaiveDate,
    violation_type: ViolationType,
    deviation: Duration,
    details: String,
    day: DayRecords<'_>,
    now: DateTime<Utc>,
) -> PolicyResult<(Option<Violation>, Option<Absence>)> {
    let already_recorded = day
        .violations
        .iter()
        .any(|v| v.key() == (user_id, date, violation_type));

    let violation = (!already_recorded).then(|| Violation {
        id: Uuid::new_v4(),
        user_id,
        violation_type,
        date,
        minutes: deviation.num_minutes(),
        deduction_amount: deduction(deviation, schedule.deduction_rate),
        details: details.clone(),
        created_at: now,
    });

    let (excused, unexcused) = match violation_type {
        ViolationType::LateArrival => (
            AbsenceType::LateWithPermission,
            AbsenceType::LateWithoutPermission,
        ),
        ViolationType::EarlyLeave => (
            AbsenceType::LeaveWithPermission,
            AbsenceType::LeaveWithoutPermission,
        ),
    };

    let covered = day.absences.iter().any(|a| {
        a.user_id == user_id
            && a.covers(date)
            && ((a.absence_type == excused && a.status == AbsenceStatus::Approved)
                || a.absence_type == unexcused)
    });

    let absence = if covered {
        None
    } else {
        Some(absence::create(
            AbsenceDraft {
                user_id: Some(user_id),
                date: Some(date),
                absence_type: Some(unexcused),
                reason: Some(details),
                ..Default::default()
            },
            now,
        )?)
    };

    Ok((violation, absence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rules(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn schedule() -> WorkSchedule {
        WorkSchedule::from_rules(
            &rules(&[(CHECK_IN_RULE, "09:00"), (CHECK_OUT_RULE, "17:00")]),
            FixedOffset::east_opt(0).unwrap(),
        )
        .unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn missing_or_broken_check_in_rule_is_a_configuration_error() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(matches!(
            WorkSchedule::from_rules(&HashMap::new(), utc),
            Err(PolicyError::Configuration(_))
        ));
        assert!(matches!(
            WorkSchedule::from_rules(&rules(&[(CHECK_IN_RULE, "nine")]), utc),
            Err(PolicyError::Configuration(_))
        ));
        assert!(matches!(
            WorkSchedule::from_rules(
                &rules(&[(CHECK_IN_RULE, "09:00"), (DEDUCTION_RATE_RULE, "-1")]),
                utc
            ),
            Err(PolicyError::Configuration(_))
        ));

        let lenient = WorkSchedule::from_rules(&rules(&[(CHECK_IN_RULE, "09:00")]), utc).unwrap();
        assert_eq!(lenient.check_out, None);
        assert_eq!(lenient.deduction_rate, DEFAULT_DEDUCTION_RATE);
    }

    #[test]
    fn expected_time_follows_company_offset() {
        let plus7 = FixedOffset::east_opt(7 * 3600).unwrap();
        let schedule = WorkSchedule::from_rules(&rules(&[(CHECK_IN_RULE, "09:00")]), plus7).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(
            schedule.expected_check_in(day).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap()
        );
        // 23:30 UTC is already the next morning locally
        assert_eq!(
            schedule.local_date(Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap()),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn on_time_check_in_has_no_penalty() {
        let outcome = check_in(&schedule(), Uuid::new_v4(), None, DayRecords::default(), at(8, 55))
            .unwrap();
        assert!(outcome.attendance.on_time);
        assert!(outcome.punctuality.lateness.is_zero());
        assert!(outcome.violation.is_none());
        assert!(outcome.absence.is_none());
    }

    #[test]
    fn late_check_in_yields_violation_and_unexcused_absence() {
        let user = Uuid::new_v4();
        let outcome = check_in(&schedule(), user, None, DayRecords::default(), at(10, 30)).unwrap();

        assert!(!outcome.attendance.on_time);
        let violation = outcome.violation.unwrap();
        assert_eq!(violation.violation_type, ViolationType::LateArrival);
        assert_eq!(violation.minutes, 90);
        assert!((violation.deduction_amount - 1.5 * 0.05).abs() < 1e-12);

        let absence = outcome.absence.unwrap();
        assert_eq!(absence.absence_type, AbsenceType::LateWithoutPermission);
        assert_eq!(absence.status, AbsenceStatus::Pending);
        assert_eq!(absence.user_id, user);
    }

    #[test]
    fn approved_late_permission_suppresses_the_absence_only() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let permission = absence::create(
            AbsenceDraft {
                user_id: Some(user),
                date: Some(date),
                absence_type: Some(AbsenceType::LateWithPermission),
                reason: Some("Dentist".to_string()),
                ..Default::default()
            },
            at(7, 0),
        )
        .unwrap();
        let approved =
            absence::transition(&permission, AbsenceStatus::Approved, Some(Uuid::new_v4()), at(7, 5))
                .unwrap();

        let absences = [approved];
        let day = DayRecords {
            violations: &[],
            absences: &absences,
        };
        let outcome = check_in(&schedule(), user, None, day, at(9, 30)).unwrap();
        assert!(outcome.violation.is_some());
        assert!(outcome.absence.is_none());
    }

    #[test]
    fn recorded_violation_is_not_emitted_twice() {
        let user = Uuid::new_v4();
        let first = check_in(&schedule(), user, None, DayRecords::default(), at(9, 30)).unwrap();
        let violations = [first.violation.clone().unwrap()];
        let day = DayRecords {
            violations: &violations,
            absences: &[],
        };
        let again = check_in(&schedule(), user, None, day, at(9, 30)).unwrap();
        assert!(again.violation.is_none());
    }

    #[test]
    fn second_check_in_on_the_same_day_is_rejected() {
        let user = Uuid::new_v4();
        let first = check_in(&schedule(), user, None, DayRecords::default(), at(9, 0)).unwrap();
        let err = check_in(
            &schedule(),
            user,
            Some(&first.attendance),
            DayRecords::default(),
            at(12, 0),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateSession { .. }));
    }

    #[test]
    fn check_out_rules() {
        let user = Uuid::new_v4();
        let schedule = schedule();

        let missing = check_out(&schedule, user, None, DayRecords::default(), at(17, 0));
        assert!(matches!(missing, Err(PolicyError::NotFound(_))));

        let session = check_in(&schedule, user, None, DayRecords::default(), at(9, 0))
            .unwrap()
            .attendance;
        let early = check_out(&schedule, user, Some(session), DayRecords::default(), at(16, 0))
            .unwrap();
        assert!(early.early_leave.early);
        assert_eq!(early.early_leave.early_by, Duration::hours(1));
        let violation = early.violation.unwrap();
        assert_eq!(violation.violation_type, ViolationType::EarlyLeave);
        assert_eq!(
            early.absence.unwrap().absence_type,
            AbsenceType::LeaveWithoutPermission
        );

        let twice = check_out(
            &schedule,
            user,
            Some(early.attendance),
            DayRecords::default(),
            at(17, 0),
        );
        assert!(matches!(twice, Err(PolicyError::Validation(_))));
    }

    #[test]
    fn open_session_from_an_earlier_day_blocks_check_in() {
        let user = Uuid::new_v4();
        let schedule = schedule();
        let yesterday = check_in(
            &schedule,
            user,
            None,
            DayRecords::default(),
            at(9, 0) - Duration::days(1),
        )
        .unwrap()
        .attendance;

        let err = check_in(&schedule, user, Some(&yesterday), DayRecords::default(), at(9, 0))
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::DuplicateSession {
                user_id: user,
                date: yesterday.work_date,
            }
        );

        let mut closed = yesterday;
        closed.check_out_time = Some(at(17, 0) - Duration::days(1));
        let today = check_in(&schedule, user, Some(&closed), DayRecords::default(), at(9, 0))
            .unwrap();
        assert_eq!(today.attendance.work_date, schedule.local_date(at(9, 0)));
    }

    #[test]
    fn check_out_after_midnight_closes_the_previous_session() {
        let user = Uuid::new_v4();
        let schedule = schedule();
        let evening = at(22, 0) - Duration::days(1);
        let session = check_in(&schedule, user, None, DayRecords::default(), evening)
            .unwrap()
            .attendance;

        let closed = check_out(&schedule, user, Some(session.clone()), DayRecords::default(), at(1, 30))
            .unwrap();
        assert_eq!(closed.attendance.id, session.id);
        assert_eq!(closed.attendance.work_date, session.work_date);
        assert_eq!(closed.attendance.check_out_time, Some(at(1, 30)));
        assert!(!closed.early_leave.early);

        let stale = check_out(
            &schedule,
            user,
            Some(closed.attendance),
            DayRecords::default(),
            at(9, 0),
        );
        assert!(matches!(stale, Err(PolicyError::NotFound(_))));
    }

    #[test]
    fn no_scheduled_check_out_means_never_early() {
        let leave = evaluate_check_out(at(12, 0), None);
        assert!(!leave.early);
        assert!(leave.early_by.is_zero());
    }
}
