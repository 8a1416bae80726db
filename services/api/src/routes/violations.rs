//! Recorded rule violations

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use policy::authorization::Actor;

use super::record_owner;
use crate::{
    AppState,
    error::ApiResult,
    models::{ApiResponse, RecordQuery},
};

pub async fn list_violations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = record_owner(actor, query.user_id)?;
    let (first_day, last_day) = query.range()?.window(Utc::now()).local_days(state.offset);

    let violations = state
        .violation_repository
        .list_between(Some(user_id), first_day, last_day)
        .await?;
    Ok(Json(ApiResponse::ok(violations)))
}
