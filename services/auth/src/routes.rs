//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::token::Claims;
use policy::login_code::LoginCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    AppState,
    repositories::{Account, account::verify_password},
};

/// Request for email and password login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for login with the shared code
#[derive(Deserialize)]
pub struct CodeLoginRequest {
    pub nickname: String,
    pub code: String,
}

/// Issued access token
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub account: Account,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let root_only = Router::new()
        .route("/auth/active-code", get(active_code))
        .route("/auth/rotate-code", post(rotate_code))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_root,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/login-with-code", post(login_with_code))
        .merge(root_only)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Email and password login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = payload.email.trim().to_lowercase();
    info!("Login attempt for {}", email);

    let throttle_key = format!("login:{}", email);
    if !state.rate_limiter.check(&throttle_key).await {
        return Err(AuthError::TooManyRequests);
    }

    let account = state
        .account_repository
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up account: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    let hash = account
        .password_hash
        .as_deref()
        .ok_or(AuthError::InvalidCredentials)?;
    let valid = verify_password(hash, &payload.password).map_err(|e| {
        error!("Stored password hash for {} is unusable: {}", account.id, e);
        AuthError::InternalServerError
    })?;
    if !valid || !account.can_log_in() {
        return Err(AuthError::InvalidCredentials);
    }

    state.rate_limiter.reset(&throttle_key).await;
    issue_token(&state, account).map(success)
}

/// Passwordless login with the shared code; the code rotates on success
pub async fn login_with_code(
    State(state): State<AppState>,
    Json(payload): Json<CodeLoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let nickname = payload.nickname.trim().to_string();
    info!("Code login attempt for {}", nickname);

    let throttle_key = format!("code:{}", nickname);
    if !state.rate_limiter.check(&throttle_key).await {
        return Err(AuthError::TooManyRequests);
    }

    // Resolve the account first so an unknown nickname cannot burn the code
    let account = state
        .account_repository
        .find_by_nickname(&nickname)
        .await
        .map_err(|e| {
            error!("Failed to look up account: {}", e);
            AuthError::InternalServerError
        })?
        .filter(Account::can_log_in)
        .ok_or(AuthError::InvalidCredentials)?;

    if state.code_store.redeem(payload.code.trim()).await.is_none() {
        warn!("Invalid login code presented for {}", nickname);
        return Err(AuthError::InvalidCredentials);
    }

    state.rate_limiter.reset(&throttle_key).await;
    issue_token(&state, account).map(success)
}

/// Show the current login code, issuing one if none is active
pub async fn active_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<serde_json::Value> {
    info!("Login code requested by {}", claims.sub);
    success(state.code_store.issue().await)
}

/// Replace the login code immediately
pub async fn rotate_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<serde_json::Value> {
    info!("Login code rotation requested by {}", claims.sub);
    let code: LoginCode = state.code_store.rotate().await;
    success(code)
}

fn issue_token(state: &AppState, account: Account) -> Result<TokenResponse, AuthError> {
    let access_token = state
        .jwt_service
        .generate_access_token(account.id, account.role)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
        account,
    })
}

fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// Custom error type for authentication errors
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    InvalidCredentials,
    Forbidden(String),
    TooManyRequests,
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, try again later".to_string(),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
