use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod jwt;
mod middleware;
mod rate_limiter;
mod repositories;
mod routes;
mod settings;

use common::database;
use policy::login_code::AuthCodeStore;
use policy::validation::{validate_email, validate_password};

use crate::{
    jwt::JwtService,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::AccountRepository,
    settings::Settings,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub account_repository: AccountRepository,
    pub rate_limiter: RateLimiter,
    pub code_store: Arc<AuthCodeStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting authentication service");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    let jwt_config = jwt::JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    let account_repository = AccountRepository::new(pool);
    bootstrap_root(&account_repository, &settings).await?;

    let app_state = AppState {
        jwt_service,
        account_repository,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        code_store: Arc::new(AuthCodeStore::new()),
    };

    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the root account on first start
async fn bootstrap_root(accounts: &AccountRepository, settings: &Settings) -> Result<()> {
    if accounts.root_exists().await? {
        return Ok(());
    }

    let Some((email, password)) = settings.root_credentials() else {
        warn!("No root account exists and APP_ROOT_EMAIL/APP_ROOT_PASSWORD are not set");
        return Ok(());
    };

    validate_email(email).map_err(anyhow::Error::msg)?;
    validate_password(password).map_err(anyhow::Error::msg)?;

    let root = accounts
        .create_root(&settings.root_nickname, &email.to_lowercase(), password)
        .await?;
    info!("Root account {} created", root.id);
    Ok(())
}
