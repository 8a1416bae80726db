//! Work-hour aggregation and absence statistics
//!
//! All arithmetic runs on integer seconds; hours are rounded to two decimals
//! only when the report is built, so identical input always gives identical
//! output.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{
    Absence, AbsenceKind, AbsenceStatus, AbsenceType, Attendance, Employee, EmployeeStatus,
    Violation, ViolationType,
};
use crate::PolicyError;

/// Reporting period ending now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    Week,
    Month,
    Year,
}

impl ReportRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportRange::Week => "week",
            ReportRange::Month => "month",
            ReportRange::Year => "year",
        }
    }

    /// `[now - period, now]`
    pub fn window(&self, now: DateTime<Utc>) -> ReportWindow {
        let start = match self {
            ReportRange::Week => now - Duration::days(7),
            ReportRange::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
            ReportRange::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(now - Duration::days(365)),
        };
        ReportWindow { start, end: now }
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportRange {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(ReportRange::Week),
            "month" => Ok(ReportRange::Month),
            "year" => Ok(ReportRange::Year),
            other => Err(PolicyError::InvalidRange(other.to_string())),
        }
    }
}

/// Inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// First and last calendar day of the window in company local time
    pub fn local_days(&self, offset: FixedOffset) -> (NaiveDate, NaiveDate) {
        (
            self.start.with_timezone(&offset).date_naive(),
            self.end.with_timezone(&offset).date_naive(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeStats {
    pub user_id: Uuid,
    pub name: String,
    pub department: Option<String>,
    pub sessions: usize,
    pub average_check_in: Option<String>,
    pub average_check_out: Option<String>,
    pub total_hours: f64,
    pub lateness_hours: f64,
    pub effective_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEmployee {
    pub rank: usize,
    pub user_id: Uuid,
    pub name: String,
    pub department: Option<String>,
    pub effective_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub employee_count: usize,
    pub average_check_in: Option<String>,
    pub average_work_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeStatsReport {
    pub window: ReportWindow,
    pub total_active_employees: usize,
    pub total_effective_hours: f64,
    pub average_check_in: Option<String>,
    pub average_check_out: Option<String>,
    pub employees: Vec<EmployeeStats>,
    pub top: Vec<RankedEmployee>,
    pub departments: Vec<DepartmentStats>,
}

/// Employees without a department are grouped under this name
pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

#[derive(Debug, Default)]
struct Accumulator {
    sessions: usize,
    check_ins: Vec<u32>,
    check_outs: Vec<u32>,
    raw_seconds: i64,
    lateness_seconds: i64,
    closed_lateness_seconds: i64,
}

impl Accumulator {
    fn add(&mut self, session: &Attendance, offset: FixedOffset) {
        let lateness = (session.check_in_time - session.expected_time)
            .max(Duration::zero())
            .num_seconds();

        self.sessions += 1;
        self.check_ins
            .push(seconds_of_day(session.check_in_time, offset));
        self.lateness_seconds += lateness;

        if let Some(out) = session.check_out_time {
            self.check_outs.push(seconds_of_day(out, offset));
            self.raw_seconds += (out - session.check_in_time).num_seconds().max(0);
            self.closed_lateness_seconds += lateness;
        }
    }

    /// Raw closed-session time minus the lateness of those sessions
    fn effective_seconds(&self) -> i64 {
        (self.raw_seconds - self.closed_lateness_seconds).max(0)
    }
}

/// Aggregate attendance over `window`.
///
/// Per employee figures cover every employee passed in; company totals,
/// rankings and department figures cover active employees only. Ties in the
/// ranking keep the order of `employees`.
pub fn compute_employee_stats(
    employees: &[Employee],
    sessions: &[Attendance],
    window: &ReportWindow,
    offset: FixedOffset,
    top_n: usize,
) -> EmployeeStatsReport {
    let mut per_employee: HashMap<Uuid, Accumulator> = HashMap::new();
    let mut all_check_ins = Vec::new();
    let mut all_check_outs = Vec::new();

    for session in sessions.iter().filter(|s| window.contains(s.check_in_time)) {
        per_employee
            .entry(session.user_id)
            .or_default()
            .add(session, offset);
        all_check_ins.push(seconds_of_day(session.check_in_time, offset));
        if let Some(out) = session.check_out_time {
            all_check_outs.push(seconds_of_day(out, offset));
        }
    }

    let empty = Accumulator::default();
    let mut stats = Vec::with_capacity(employees.len());
    let mut ranking: Vec<(&Employee, i64)> = Vec::new();
    let mut departments: BTreeMap<String, (usize, Vec<u32>, i64)> = BTreeMap::new();
    let mut total_effective = 0i64;

    for employee in employees {
        let acc = per_employee.get(&employee.id).unwrap_or(&empty);
        let effective = acc.effective_seconds();

        stats.push(EmployeeStats {
            user_id: employee.id,
            name: employee.display_name().to_string(),
            department: employee.department.clone(),
            sessions: acc.sessions,
            average_check_in: average_time_of_day(&acc.check_ins),
            average_check_out: average_time_of_day(&acc.check_outs),
            total_hours: hours(acc.raw_seconds),
            lateness_hours: hours(acc.lateness_seconds),
            effective_hours: hours(effective),
        });

        if employee.status != EmployeeStatus::Active {
            continue;
        }

        total_effective += effective;
        ranking.push((employee, effective));

        let key = employee
            .department
            .clone()
            .unwrap_or_else(|| UNASSIGNED_DEPARTMENT.to_string());
        let entry = departments.entry(key).or_default();
        entry.0 += 1;
        entry.1.extend_from_slice(&acc.check_ins);
        entry.2 += effective;
    }

    // sort_by is stable, so equal hours keep input order
    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    let top = ranking
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (employee, effective))| RankedEmployee {
            rank: i + 1,
            user_id: employee.id,
            name: employee.display_name().to_string(),
            department: employee.department.clone(),
            effective_hours: hours(*effective),
        })
        .collect();

    let departments = departments
        .into_iter()
        .map(|(department, (count, check_ins, effective))| DepartmentStats {
            department,
            employee_count: count,
            average_check_in: average_time_of_day(&check_ins),
            average_work_hours: round2(effective as f64 / 3600.0 / count as f64),
        })
        .collect();

    EmployeeStatsReport {
        window: *window,
        total_active_employees: ranking.len(),
        total_effective_hours: hours(total_effective),
        average_check_in: average_time_of_day(&all_check_ins),
        average_check_out: average_time_of_day(&all_check_outs),
        employees: stats,
        top,
        departments,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeaveStats {
    pub with_permission: usize,
    pub without_permission: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResignStats {
    pub approved: usize,
    pub pending: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LateStats {
    pub total_incidents: usize,
    pub unique_employees: usize,
    pub average_minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AbsenceStatistics {
    pub leave: LeaveStats,
    pub resign: ResignStats,
    pub late: LateStats,
}

/// Count absences dated and violations recorded inside `window`
pub fn compute_absence_statistics(
    absences: &[Absence],
    violations: &[Violation],
    window: &ReportWindow,
    offset: FixedOffset,
) -> AbsenceStatistics {
    let (first_day, last_day) = window.local_days(offset);
    let mut stats = AbsenceStatistics::default();

    for absence in absences
        .iter()
        .filter(|a| first_day <= a.date && a.date <= last_day)
    {
        match absence.absence_type.kind() {
            AbsenceKind::FullDay => {
                if absence.status == AbsenceStatus::Pending {
                    stats.leave.pending += 1;
                } else if absence.absence_type == AbsenceType::WithPermission
                    && absence.status == AbsenceStatus::Approved
                {
                    stats.leave.with_permission += 1;
                } else if absence.absence_type == AbsenceType::WithoutPermission {
                    stats.leave.without_permission += 1;
                }
            }
            AbsenceKind::Resign => {
                stats.resign.total += 1;
                match absence.status {
                    AbsenceStatus::Approved => stats.resign.approved += 1,
                    AbsenceStatus::Pending => stats.resign.pending += 1,
                    AbsenceStatus::Rejected => {}
                }
            }
            AbsenceKind::Late | AbsenceKind::Leave => {}
        }
    }

    let late: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.violation_type == ViolationType::LateArrival)
        .filter(|v| first_day <= v.date && v.date <= last_day)
        .collect();

    if !late.is_empty() {
        let minutes: i64 = late.iter().map(|v| v.minutes).sum();
        stats.late = LateStats {
            total_incidents: late.len(),
            unique_employees: late.iter().map(|v| v.user_id).collect::<HashSet<_>>().len(),
            average_minutes: round2(minutes as f64 / late.len() as f64),
        };
    }

    stats
}

fn seconds_of_day(at: DateTime<Utc>, offset: FixedOffset) -> u32 {
    at.with_timezone(&offset).time().num_seconds_from_midnight()
}

const SECONDS_PER_DAY: u64 = 86_400;

/// Mean time of day on the 24 hour circle, rounded half up to the second.
///
/// The day is cut at its widest empty gap before averaging, so 23:30 and
/// 00:30 average to midnight. Samples that do not straddle midnight get the
/// plain arithmetic mean.
pub fn average_time_of_day(seconds: &[u32]) -> Option<String> {
    let mut sorted: Vec<u64> = seconds
        .iter()
        .map(|s| u64::from(*s) % SECONDS_PER_DAY)
        .collect();
    sorted.sort_unstable();
    let (&first, &last) = (sorted.first()?, sorted.last()?);

    let mut origin = first;
    let mut widest = first + SECONDS_PER_DAY - last;
    for pair in sorted.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > widest {
            widest = gap;
            origin = pair[1];
        }
    }

    let n = sorted.len() as u64;
    let total: u64 = sorted
        .iter()
        .map(|s| (s + SECONDS_PER_DAY - origin) % SECONDS_PER_DAY)
        .sum();
    let mean = (total + n / 2) / n;
    Some(format_time_of_day((origin + mean) % SECONDS_PER_DAY))
}

/// Render seconds since midnight as `HH:MM:SS`
pub fn format_time_of_day(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn hours(seconds: i64) -> f64 {
    round2(seconds as f64 / 3600.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewEmployee, Role};
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn active(nickname: &str, department: &str) -> Employee {
        let mut employee = Employee::create(
            NewEmployee {
                nickname: nickname.to_string(),
                role: Role::Employee,
                wallet_address: None,
                onboard_date: None,
            },
            Utc::now(),
        )
        .unwrap();
        employee.status = EmployeeStatus::Active;
        employee.department = Some(department.to_string());
        employee
    }

    fn session(user_id: Uuid, day: u32, check_in: (u32, u32), check_out: Option<(u32, u32)>) -> Attendance {
        let at = |h, m| Utc.with_ymd_and_hms(2024, 6, day, h, m, 0).unwrap();
        Attendance {
            id: Uuid::new_v4(),
            user_id,
            work_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            check_in_time: at(check_in.0, check_in.1),
            check_out_time: check_out.map(|(h, m)| at(h, m)),
            expected_time: at(9, 0),
            expected_check_out: None,
            on_time: check_in <= (9, 0),
            created_at: at(check_in.0, check_in.1),
            updated_at: at(check_in.0, check_in.1),
        }
    }

    fn june() -> ReportWindow {
        ReportWindow {
            start: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn window_days_are_local_calendar_days() {
        let window = ReportWindow {
            start: Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 8, 20, 0, 0).unwrap(),
        };
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        assert_eq!(window.local_days(utc()), (day(1), day(8)));
        assert_eq!(
            window.local_days(FixedOffset::east_opt(7 * 3600).unwrap()),
            (day(2), day(9))
        );

        let user = Uuid::new_v4();
        let created = Utc.with_ymd_and_hms(2024, 6, 9, 1, 0, 0).unwrap();
        let late = Violation {
            id: Uuid::new_v4(),
            user_id: user,
            violation_type: ViolationType::LateArrival,
            date: day(9),
            minutes: 15,
            deduction_amount: 0.0,
            details: String::new(),
            created_at: created,
        };
        let violations = [late];
        let plus7 = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(
            compute_absence_statistics(&[], &violations, &window, plus7).late.total_incidents,
            1
        );
        assert_eq!(
            compute_absence_statistics(&[], &violations, &window, utc()).late.total_incidents,
            0
        );
    }

    #[test]
    fn ranges_parse_and_reject_unknown_names() {
        assert_eq!("week".parse::<ReportRange>().unwrap(), ReportRange::Week);
        assert_eq!(
            "quarter".parse::<ReportRange>().unwrap_err(),
            PolicyError::InvalidRange("quarter".to_string())
        );

        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let month = ReportRange::Month.window(now);
        assert_eq!(month.end, now);
        assert_eq!(month.start, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(ReportRange::Week.window(now).start, now - Duration::days(7));
    }

    #[test]
    fn average_check_in_is_the_mean_time_of_day() {
        let alice = active("alice", "IT");
        let sessions = vec![
            session(alice.id, 3, (8, 45), Some((17, 0))),
            session(alice.id, 4, (9, 15), Some((17, 0))),
        ];
        let report = compute_employee_stats(&[alice], &sessions, &june(), utc(), 10);
        assert_eq!(report.average_check_in.as_deref(), Some("09:00:00"));
        assert_eq!(report.employees[0].average_check_in.as_deref(), Some("09:00:00"));
        assert_eq!(report.average_check_out.as_deref(), Some("17:00:00"));
    }

    #[test]
    fn average_time_of_day_wraps_around_midnight() {
        let at = |h: u32, m: u32| h * 3600 + m * 60;
        assert_eq!(
            average_time_of_day(&[at(23, 30), at(0, 30)]).as_deref(),
            Some("00:00:00")
        );
        assert_eq!(
            average_time_of_day(&[at(23, 0), at(23, 40), at(1, 20)]).as_deref(),
            Some("00:00:00")
        );
        assert_eq!(
            average_time_of_day(&[at(8, 45), at(9, 15)]).as_deref(),
            Some("09:00:00")
        );
        assert_eq!(average_time_of_day(&[at(17, 0)]).as_deref(), Some("17:00:00"));
        assert_eq!(average_time_of_day(&[]), None);
    }

    #[test]
    fn effective_hours_subtract_lateness() {
        let bob = active("bob", "IT");
        let sessions = vec![session(bob.id, 3, (9, 30), Some((17, 30)))];
        let report = compute_employee_stats(&[bob], &sessions, &june(), utc(), 10);
        let stats = &report.employees[0];
        assert_eq!(stats.total_hours, 8.0);
        assert_eq!(stats.lateness_hours, 0.5);
        assert_eq!(stats.effective_hours, 7.5);
        assert_eq!(report.total_effective_hours, 7.5);
    }

    #[test]
    fn open_sessions_count_but_add_no_hours() {
        let carol = active("carol", "Ops");
        let sessions = vec![session(carol.id, 3, (9, 0), None)];
        let report = compute_employee_stats(&[carol], &sessions, &june(), utc(), 10);
        assert_eq!(report.employees[0].sessions, 1);
        assert_eq!(report.employees[0].effective_hours, 0.0);
        assert_eq!(report.average_check_out, None);
    }

    #[test]
    fn ranking_is_descending_with_stable_ties() {
        let a = active("aaa", "IT");
        let b = active("bbb", "IT");
        let c = active("ccc", "Sales");
        let mut pending = active("ddd", "Sales");
        pending.status = EmployeeStatus::Pending;

        let sessions = vec![
            session(a.id, 3, (9, 0), Some((15, 0))),
            session(b.id, 3, (9, 0), Some((17, 0))),
            session(c.id, 3, (9, 0), Some((15, 0))),
            session(pending.id, 3, (9, 0), Some((23, 0))),
        ];
        let employees = [a.clone(), b.clone(), c.clone(), pending];
        let report = compute_employee_stats(&employees, &sessions, &june(), utc(), 2);

        assert_eq!(report.total_active_employees, 3);
        assert_eq!(report.top.len(), 2);
        assert_eq!((report.top[0].rank, report.top[0].user_id), (1, b.id));
        assert_eq!((report.top[1].rank, report.top[1].user_id), (2, a.id));
        assert_eq!(report.total_effective_hours, 20.0);
        assert_eq!(report.employees.len(), 4);

        assert_eq!(report.departments.len(), 2);
        assert_eq!(report.departments[0].department, "IT");
        assert_eq!(report.departments[0].employee_count, 2);
        assert_eq!(report.departments[0].average_work_hours, 7.0);
        assert_eq!(report.departments[1].employee_count, 1);
    }

    #[test]
    fn sessions_outside_the_window_are_ignored() {
        let dan = active("dan", "IT");
        let mut old = session(dan.id, 3, (9, 0), Some((17, 0)));
        old.check_in_time = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let report = compute_employee_stats(&[dan], &[old], &june(), utc(), 5);
        assert_eq!(report.employees[0].sessions, 0);
        assert_eq!(report.average_check_in, None);
    }

    #[test]
    fn absence_statistics_group_by_kind() {
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
        let make = |absence_type, status| Absence {
            id: Uuid::new_v4(),
            user_id: user,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            absence_type,
            reason: "r".to_string(),
            status,
            processed_by: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };
        let absences = vec![
            make(AbsenceType::WithPermission, AbsenceStatus::Approved),
            make(AbsenceType::WithPermission, AbsenceStatus::Pending),
            make(AbsenceType::WithoutPermission, AbsenceStatus::Approved),
            make(AbsenceType::Resign, AbsenceStatus::Pending),
            make(AbsenceType::Resign, AbsenceStatus::Approved),
        ];
        let late = |user_id, minutes| Violation {
            id: Uuid::new_v4(),
            user_id,
            violation_type: ViolationType::LateArrival,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            minutes,
            deduction_amount: 0.0,
            details: String::new(),
            created_at: now,
        };
        let violations = vec![late(user, 10), late(user, 21), late(Uuid::new_v4(), 30)];

        let stats = compute_absence_statistics(&absences, &violations, &june(), utc());
        assert_eq!(
            stats.leave,
            LeaveStats {
                with_permission: 1,
                without_permission: 1,
                pending: 1
            }
        );
        assert_eq!(
            stats.resign,
            ResignStats {
                approved: 1,
                pending: 1,
                total: 2
            }
        );
        assert_eq!(stats.late.total_incidents, 3);
        assert_eq!(stats.late.unique_employees, 2);
        assert_eq!(stats.late.average_minutes, 20.33);
    }

    #[test]
    fn time_of_day_rounds_to_nearest_second() {
        assert_eq!(average_time_of_day(&[0, 1]).as_deref(), Some("00:00:01"));
        assert_eq!(average_time_of_day(&[]), None);
        assert_eq!(format_time_of_day(86_399), "23:59:59");
    }
}
