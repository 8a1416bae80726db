//! Authentication middleware for JWT token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use policy::authorization::Actor;
use policy::models::Role;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Authentication middleware
///
/// Verifies the bearer token, refuses employees who left the company and
/// stores the caller as an [`Actor`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify(bearer.token()).map_err(|e| {
        warn!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    let role: Role = claims.role.parse().map_err(|_| {
        warn!("Token for {} carries unknown role {}", claims.sub, claims.role);
        ApiError::Unauthorized
    })?;

    if state.departures.contains(claims.sub).await {
        warn!("Token for {} refused, the employee has left the company", claims.sub);
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(Actor {
        id: claims.sub,
        role,
    });

    Ok(next.run(req).await)
}
