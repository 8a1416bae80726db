//! Company rules

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use policy::PolicyError;
use policy::attendance::{CHECK_IN_RULE, CHECK_OUT_RULE, DEDUCTION_RATE_RULE, WorkSchedule};
use policy::authorization::{Action, Actor, authorize};
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    ledger::LedgerEvent,
    models::{ApiResponse, RuleRequest, Synced},
};

/// Rules the attendance evaluator reads
const SCHEDULE_RULES: [&str; 3] = [CHECK_IN_RULE, CHECK_OUT_RULE, DEDUCTION_RATE_RULE];

pub async fn list_rules(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rules = state.rule_repository.list().await?;
    Ok(Json(ApiResponse::ok(rules)))
}

/// Create or replace a rule
pub async fn upsert_rule(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
    Json(payload): Json<RuleRequest>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::ManageRules)?;

    let name = name.trim().to_string();
    let details = payload.details.trim().to_string();
    if name.is_empty() || details.is_empty() {
        return Err(ApiError::Validation(
            "Rule name and details are required".to_string(),
        ));
    }

    let mut tx = state.db_pool.begin().await?;
    if SCHEDULE_RULES.contains(&name.as_str()) {
        let mut rules = state.rule_repository.load_map(&mut tx).await?;
        rules.insert(name.clone(), details.clone());
        // Refuse a change that would leave the schedule unreadable
        WorkSchedule::from_rules(&rules, state.offset).map_err(|e| match e {
            PolicyError::Configuration(reason) => ApiError::Validation(reason),
            other => other.into(),
        })?;
    }

    let rule = state
        .rule_repository
        .upsert(&mut tx, &name, &details, actor.id)
        .await?;
    let event = LedgerEvent::UpdateCompanyRule {
        rule_id: name,
        details,
    };
    let event = state.ledger.enqueue(&mut tx, &event).await?;
    tx.commit().await?;

    info!("Rule {} set to {} by {}", rule.rule_name, rule.details, actor.id);
    let ledger_synced = state.ledger.sync(event).await;

    Ok(Json(ApiResponse::with_message(
        "Rule saved",
        Synced {
            record: rule,
            ledger_synced,
        },
    )))
}
