//! Configuration module for Keygate.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the API key credential.
    #[serde(default = "default_header")]
    pub header: String,
    /// Authorization scheme prefix expected before the key.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Upper bound for a single record-store lookup, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Secret for signing session tokens (the upstream identity factor).
    pub session_secret: String,
    /// Issuer claim for session tokens.
    #[serde(default = "default_session_issuer")]
    pub session_issuer: String,
    /// Session token validity in hours.
    #[serde(default = "default_token_duration_hours")]
    pub token_duration_hours: i64,
    /// Identities (with their API keys) to seed into the store at startup.
    #[serde(default)]
    pub seed_identities: Vec<SeedIdentity>,
}

/// An identity to provision at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedIdentity {
    /// Stable principal label (e.g. an email or service name).
    pub subject: String,
    /// The API key this identity must present.
    pub api_key: String,
}

fn default_header() -> String {
    "authorization".to_string()
}

fn default_scheme() -> String {
    "Bearer".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    2_000
}

fn default_session_issuer() -> String {
    "keygate".to_string()
}

fn default_token_duration_hours() -> i64 {
    24
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (KEYGATE_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with KEYGATE_ prefix
            .add_source(
                Environment::with_prefix("KEYGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
