//! Employee records

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use policy::authorization::{Action, Actor, authorize, authorize_employee_update};
use policy::models::{Employee, EmployeePatch, NewEmployee};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    ledger::LedgerEvent,
    models::{ApiResponse, EmployeeFilter, EmployeeListQuery, Synced},
};

/// Create a pending employee record
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<NewEmployee>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::CreateEmployee)?;
    let employee = Employee::create(payload, Utc::now())?;

    let mut tx = state.db_pool.begin().await?;
    state.employee_repository.insert(&mut tx, &employee).await?;
    let event = match &employee.wallet_address {
        Some(wallet) => {
            let event = LedgerEvent::AddEmployee {
                wallet_address: wallet.clone(),
                salary: employee.salary,
            };
            state.ledger.enqueue(&mut tx, &event).await?
        }
        None => None,
    };
    tx.commit().await?;

    info!("Employee {} ({}) created by {}", employee.id, employee.nickname, actor.id);
    let ledger_synced = state.ledger.sync(event).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Employee created",
            Synced {
                record: employee,
                ledger_synced,
            },
        )),
    ))
}

/// List employees matching the query filters
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<EmployeeListQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ViewEmployees)?;
    let filter = EmployeeFilter::try_from(&query)?;

    let employees = state.employee_repository.list(&filter).await?;
    Ok(Json(ApiResponse::ok(employees)))
}

/// Get an employee by ID
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if id != actor.id {
        authorize(actor.role, Action::ViewEmployees)?;
    }

    let employee = state
        .employee_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    Ok(Json(ApiResponse::ok(employee)))
}

/// Partial update gated field by field
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EmployeePatch>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::UpdateEmployee)?;

    let mut tx = state.db_pool.begin().await?;
    let mut employee = state
        .employee_repository
        .find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    let patch = authorize_employee_update(actor, &employee, patch)?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No updatable fields provided".to_string()));
    }
    patch.validate()?;

    let salary_changed = patch.salary.is_some_and(|s| s != employee.salary);
    let activated = employee.apply(patch, Utc::now());
    state.employee_repository.update(&mut tx, &employee).await?;

    let event = match (&employee.wallet_address, salary_changed) {
        (Some(wallet), true) => {
            let event = LedgerEvent::UpdateSalary {
                wallet_address: wallet.clone(),
                salary: employee.salary,
            };
            state.ledger.enqueue(&mut tx, &event).await?
        }
        _ => None,
    };
    tx.commit().await?;

    if activated {
        info!("Employee {} completed their profile and is now active", employee.id);
    }
    let ledger_synced = state.ledger.sync(event).await;
    let message = if activated {
        "Profile completed, account activated"
    } else {
        "Employee updated"
    };

    Ok(Json(ApiResponse::with_message(
        message,
        Synced {
            record: employee,
            ledger_synced,
        },
    )))
}
