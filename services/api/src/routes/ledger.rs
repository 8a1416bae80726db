//! Manual retry of ledger notifications

use axum::{Extension, Json, extract::State, response::IntoResponse};
use policy::authorization::{Action, Actor, authorize};

use crate::{AppState, error::ApiResult, models::ApiResponse};

pub async fn flush(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<impl IntoResponse> {
    authorize(actor.role, Action::FlushLedger)?;

    let report = state.ledger.flush().await?;
    Ok(Json(ApiResponse::with_message(
        "Ledger notifications delivered",
        report,
    )))
}
