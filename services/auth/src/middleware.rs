//! Middleware for JWT token validation on the root-only endpoints

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use policy::authorization::{Action, authorize};
use policy::models::Role;
use tracing::warn;

use crate::{AppState, routes::AuthError};

/// Require a valid access token whose role may see the login code
pub async fn require_root(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let claims = state
        .jwt_service
        .verifier()
        .verify(bearer.token())
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            AuthError::Unauthorized
        })?;

    let role: Role = claims.role.parse().map_err(|_| AuthError::Unauthorized)?;
    authorize(role, Action::ViewLoginCode).map_err(|e| AuthError::Forbidden(e.to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
