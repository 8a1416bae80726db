//! Salary after deductions

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use policy::authorization::Actor;
use policy::payroll::{self, SalarySummary};
use policy::report::{ReportRange, ReportWindow};
use serde::Serialize;
use uuid::Uuid;

use super::record_owner;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{ApiResponse, RecordQuery},
};

#[derive(Debug, Serialize)]
pub struct SalaryStatement {
    pub user_id: Uuid,
    pub range: ReportRange,
    pub window: ReportWindow,
    #[serde(flatten)]
    pub summary: SalarySummary,
}

pub async fn get_salary(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = record_owner(actor, query.user_id)?;
    let range = query.range()?;
    let window = range.window(Utc::now());

    let employee = state
        .employee_repository
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;
    let (first_day, last_day) = window.local_days(state.offset);
    let violations = state
        .violation_repository
        .list_between(Some(user_id), first_day, last_day)
        .await?;

    Ok(Json(ApiResponse::ok(SalaryStatement {
        user_id,
        range,
        window,
        summary: payroll::summarize(employee.salary, &violations),
    })))
}
