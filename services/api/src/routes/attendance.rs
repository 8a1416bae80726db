//! Check-in, check-out and session history

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use policy::attendance::{self as engine, DayRecords, WorkSchedule};
use policy::authorization::{Action, Actor, authorize};
use policy::models::{Absence, Attendance, Violation};
use serde::Serialize;
use sqlx::PgConnection;
use tracing::info;

use super::record_owner;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{ApiResponse, RecordQuery},
};

/// Outcome of a punch
#[derive(Debug, Serialize)]
pub struct PunchReceipt {
    pub attendance: Attendance,
    pub on_time: bool,
    /// Minutes late on check-in or early on check-out
    pub deviation_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    /// Absence filed automatically for an unexcused deviation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence: Option<Absence>,
}

struct Day {
    schedule: WorkSchedule,
    session: Option<Attendance>,
    violations: Vec<Violation>,
    absences: Vec<Absence>,
}

impl Day {
    fn records(&self) -> DayRecords<'_> {
        DayRecords {
            violations: &self.violations,
            absences: &self.absences,
        }
    }
}

async fn load_day(
    state: &AppState,
    conn: &mut PgConnection,
    actor: Actor,
    now: DateTime<Utc>,
) -> ApiResult<Day> {
    let rules = state.rule_repository.load_map(conn).await?;
    let schedule = WorkSchedule::from_rules(&rules, state.offset)?;

    let session = state
        .attendance_repository
        .latest_for_update(conn, actor.id)
        .await?;
    // An open session is evaluated against the day it started on
    let date = session
        .as_ref()
        .filter(|s| s.is_open())
        .map_or_else(|| schedule.local_date(now), |s| s.work_date);
    let violations = state
        .violation_repository
        .for_day(conn, actor.id, date)
        .await?;
    let absences = state
        .absence_repository
        .covering(conn, actor.id, date)
        .await?;

    Ok(Day {
        schedule,
        session,
        violations,
        absences,
    })
}

async fn record_penalty(
    state: &AppState,
    conn: &mut PgConnection,
    violation: &Option<Violation>,
    absence: &Option<Absence>,
) -> ApiResult<()> {
    if let Some(violation) = violation {
        state.violation_repository.insert(conn, violation).await?;
    }
    if let Some(absence) = absence {
        state.absence_repository.insert(conn, absence).await?;
    }
    Ok(())
}

/// Open today's session
pub async fn check_in(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::RecordAttendance)?;
    let now = Utc::now();

    let mut tx = state.db_pool.begin().await?;
    let day = load_day(&state, &mut tx, actor, now).await?;
    let outcome = engine::check_in(
        &day.schedule,
        actor.id,
        day.session.as_ref(),
        day.records(),
        now,
    )?;

    // A concurrent check-in may have won the race since the lookup
    if !state
        .attendance_repository
        .insert(&mut tx, &outcome.attendance)
        .await?
    {
        return Err(ApiError::DuplicateSession(format!(
            "Employee {} already has a session for {}",
            actor.id, outcome.attendance.work_date
        )));
    }
    record_penalty(&state, &mut tx, &outcome.violation, &outcome.absence).await?;
    tx.commit().await?;

    info!(
        user_id = %actor.id,
        on_time = outcome.punctuality.on_time,
        "Check-in recorded"
    );
    let message = if outcome.punctuality.on_time {
        "Checked in on time"
    } else {
        "Checked in late"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        PunchReceipt {
            on_time: outcome.punctuality.on_time,
            deviation_minutes: outcome.punctuality.lateness.num_minutes(),
            attendance: outcome.attendance,
            violation: outcome.violation,
            absence: outcome.absence,
        },
    )))
}

/// Close the caller's open session
pub async fn check_out(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::RecordAttendance)?;
    let now = Utc::now();

    let mut tx = state.db_pool.begin().await?;
    let day = load_day(&state, &mut tx, actor, now).await?;
    let outcome = engine::check_out(
        &day.schedule,
        actor.id,
        day.session.clone(),
        day.records(),
        now,
    )?;

    state
        .attendance_repository
        .close(&mut tx, &outcome.attendance)
        .await?;
    record_penalty(&state, &mut tx, &outcome.violation, &outcome.absence).await?;
    tx.commit().await?;

    info!(
        user_id = %actor.id,
        early = outcome.early_leave.early,
        "Check-out recorded"
    );
    let message = if outcome.early_leave.early {
        "Checked out early"
    } else {
        "Checked out"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        PunchReceipt {
            on_time: !outcome.early_leave.early,
            deviation_minutes: outcome.early_leave.early_by.num_minutes(),
            attendance: outcome.attendance,
            violation: outcome.violation,
            absence: outcome.absence,
        },
    )))
}

/// Sessions of the caller, or of `user_id` for privileged roles
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = record_owner(actor, query.user_id)?;
    let window = query.range()?.window(Utc::now());

    let sessions = state
        .attendance_repository
        .list_between(Some(user_id), window.start, window.end)
        .await?;
    Ok(Json(ApiResponse::ok(sessions)))
}
