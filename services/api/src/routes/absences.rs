//! Absence requests and their approval

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use policy::absence::{self as workflow, AbsenceFilter, AbsenceQuery};
use policy::authorization::{Action, Actor, authorize, is_allowed};
use policy::models::{AbsenceDraft, AbsenceKind, AbsenceStatus};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{AbsenceStatusRequest, ApiResponse},
};

/// File an absence; HR may file on behalf of another employee
pub async fn create_absence(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(mut draft): Json<AbsenceDraft>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ManageOwnAbsences)?;
    match draft.user_id {
        Some(user_id) if user_id != actor.id => {
            authorize(actor.role, Action::ProcessAbsences)?;
        }
        _ => draft.user_id = Some(actor.id),
    }

    let absence = workflow::create(draft, Utc::now())?;
    if state
        .employee_repository
        .find_by_id(absence.user_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Employee not found".to_string()));
    }

    let mut tx = state.db_pool.begin().await?;
    state.absence_repository.insert(&mut tx, &absence).await?;
    tx.commit().await?;

    info!(
        "Absence {} ({}) filed for {} by {}",
        absence.id, absence.absence_type, absence.user_id, actor.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Absence created", absence)),
    ))
}

/// Filtered listing; employees only see their own absences
pub async fn list_absences(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AbsenceQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = AbsenceFilter::parse(&query)?;
    let owner = if is_allowed(actor.role, Action::ViewOthersRecords) {
        None
    } else {
        Some(actor.id)
    };

    let absences = state.absence_repository.list(&filter, owner).await?;
    Ok(Json(ApiResponse::ok(absences)))
}

/// Approve, reject or reopen an absence
pub async fn update_absence_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AbsenceStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ProcessAbsences)?;

    let mut tx = state.db_pool.begin().await?;
    let absence = state
        .absence_repository
        .find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Absence not found".to_string()))?;

    let updated = workflow::transition(&absence, payload.status, Some(actor.id), Utc::now())?;
    if updated == absence {
        return Ok(Json(ApiResponse::with_message("Absence unchanged", updated)));
    }

    state.absence_repository.update_status(&mut tx, &updated).await?;
    let resigned = updated.absence_type.kind() == AbsenceKind::Resign
        && updated.status == AbsenceStatus::Approved;
    if resigned {
        state
            .employee_repository
            .mark_left(&mut tx, updated.user_id)
            .await?;
    }
    tx.commit().await?;

    info!(
        "Absence {} moved from {} to {} by {}",
        updated.id, absence.status, updated.status, actor.id
    );
    if resigned {
        state.departures.insert(updated.user_id).await;
        info!("Employee {} has left the company", updated.user_id);
    }

    Ok(Json(ApiResponse::with_message(
        format!("Absence {}", updated.status),
        updated,
    )))
}
