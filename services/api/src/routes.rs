//! API service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use policy::authorization::{Action, Actor, authorize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::auth_middleware};

mod absences;
mod attendance;
mod employees;
mod ledger;
mod reports;
mod rules;
mod salary;
mod violations;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/employees",
            post(employees::create_employee).get(employees::list_employees),
        )
        .route(
            "/employees/:id",
            get(employees::get_employee).patch(employees::update_employee),
        )
        .route("/attendance", get(attendance::list_attendance))
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/check-out", post(attendance::check_out))
        .route(
            "/absences",
            post(absences::create_absence).get(absences::list_absences),
        )
        .route("/absences/:id/status", patch(absences::update_absence_status))
        .route("/violations", get(violations::list_violations))
        .route("/salary", get(salary::get_salary))
        .route("/reports/employee-stats", get(reports::employee_stats))
        .route("/reports/absence-stats", get(reports::absence_stats))
        .route("/rules", get(rules::list_rules))
        .route("/rules/:name", put(rules::upsert_rule))
        .route("/ledger/flush", post(ledger::flush))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match common::database::health_check(&state.db_pool).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "api-service"
            })),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "service": "api-service",
                "database": "unreachable"
            })),
        ),
    }
}

/// Employee whose records are read: the caller unless another one is asked
/// for, which needs a privileged role
fn record_owner(actor: Actor, requested: Option<Uuid>) -> ApiResult<Uuid> {
    match requested {
        Some(user_id) if user_id != actor.id => {
            authorize(actor.role, Action::ViewOthersRecords)?;
            Ok(user_id)
        }
        _ => Ok(actor.id),
    }
}
