//! Keygate - API key authentication gate.
//!
//! Verifies a static, per-identity API key presented in a request header
//! as a second factor, and attaches the resolved identity to the request
//! so downstream handlers can trust the caller.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use sqlx::sqlite::SqlitePool;
use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::build_router;
use crate::auth::{
    ApiKeyGate, ApiKeyValidator, AuthenticationGate, CredentialExtractor, SessionManager,
};
use crate::config::{Config, SeedIdentity};
use crate::domain::{Identity, API_KEY_TAG};
use crate::error::GateResult;
use crate::storage::IdentityRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    // Initialize logging
    logging::init();

    tracing::info!("Starting Keygate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        auth_header = %config.auth.header,
        "Configuration loaded"
    );

    // Connect to database
    let pool = SqlitePool::connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    // Initialize repository and schema
    let repository = IdentityRepository::new(pool);
    repository.init_schema().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    // Seed configured identities and their keys (idempotent)
    seed_identities(&repository, &config.auth.seed_identities)
        .await
        .map_err(|e| anyhow::anyhow!("Identity seeding error: {}", e))?;

    if !config.auth.seed_identities.is_empty() {
        tracing::info!(
            identities = config.auth.seed_identities.len(),
            "Seed identities provisioned"
        );
    }

    // Build the authentication pipeline with explicit wiring
    let header = HeaderName::from_bytes(config.auth.header.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid auth header name: {}", e))?;
    let extractor = CredentialExtractor::new(config.auth.scheme.clone());
    let validator = ApiKeyValidator::new(
        Arc::new(repository),
        Duration::from_millis(config.auth.lookup_timeout_ms),
    );
    let gate: Arc<dyn AuthenticationGate> = Arc::new(ApiKeyGate::new(header, extractor, validator));

    let sessions = SessionManager::new(
        &config.auth.session_secret,
        config.auth.session_issuer.clone(),
        config.auth.token_duration_hours,
    );

    // Build router
    let app = build_router(gate, sessions);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Provision configured identities and their API keys.
///
/// Idempotent: existing identities are kept and their key tag is replaced,
/// so a restart with the same config changes nothing.
async fn seed_identities(repo: &IdentityRepository, seeds: &[SeedIdentity]) -> GateResult<()> {
    for seed in seeds {
        let identity = match repo.get_identity_by_subject(&seed.subject).await? {
            Some(identity) => identity,
            None => {
                let identity = Identity::new(seed.subject.clone());
                repo.create_identity(&identity).await?;
                tracing::info!(subject = %seed.subject, id = %identity.id, "Identity created");
                identity
            }
        };
        repo.set_tag(identity.id, API_KEY_TAG, &seed.api_key).await?;
    }
    Ok(())
}
