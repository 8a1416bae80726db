//! Attendance and absence reports

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use policy::absence::AbsenceFilter;
use policy::authorization::{Action, Actor, authorize};
use policy::report::{compute_absence_statistics, compute_employee_stats};

use crate::{
    AppState,
    error::ApiResult,
    models::{ApiResponse, ReportQuery},
};

/// Work hours, punctuality and rankings over a range
pub async fn employee_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ViewReports)?;
    let window = query.range()?.window(Utc::now());

    let employees = state.employee_repository.list_all().await?;
    let sessions = state
        .attendance_repository
        .list_between(None, window.start, window.end)
        .await?;

    let report = compute_employee_stats(&employees, &sessions, &window, state.offset, query.top());
    Ok(Json(ApiResponse::ok(report)))
}

/// Leave, resignation and lateness counts over a range
pub async fn absence_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ViewReports)?;
    let window = query.range()?.window(Utc::now());
    let (first_day, last_day) = window.local_days(state.offset);

    let filter = AbsenceFilter {
        start_date: Some(first_day),
        end_date: Some(last_day),
        ..Default::default()
    };
    let absences = state.absence_repository.list(&filter, None).await?;
    let violations = state
        .violation_repository
        .list_between(None, first_day, last_day)
        .await?;

    let stats = compute_absence_statistics(&absences, &violations, &window, state.offset);
    Ok(Json(ApiResponse::ok(stats)))
}
