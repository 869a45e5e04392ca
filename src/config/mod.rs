//! Configuration management
//!
//! Loads and validates configuration from environment variables, with
//! support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Challenge TTL in seconds (default: 300 = 5 minutes)
    pub challenge_ttl_seconds: i64,

    /// Session TTL in seconds (default: 86400 = 24 hours)
    pub session_ttl_seconds: i64,

    /// Interval between expiry sweeps in seconds (default: 300)
    pub sweep_interval_seconds: i64,

    /// Rate limit: requests per second per IP
    pub rate_limit_rps: u32,

    /// CORS allowed origins (comma-separated)
    pub cors_allowed_origins: Option<String>,

    /// Log level fallback when RUST_LOG carries no filter directives
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        // TTLs are validated rather than silently defaulted; a zero
        // challenge TTL would expire every challenge at issue time.
        let challenge_ttl_seconds =
            parse_positive("CHALLENGE_TTL_SECONDS", env_raw("CHALLENGE_TTL_SECONDS"), 300)?;
        let session_ttl_seconds =
            parse_positive("SESSION_TTL_SECONDS", env_raw("SESSION_TTL_SECONDS"), 86_400)?;
        let sweep_interval_seconds = parse_positive(
            "SWEEP_INTERVAL_SECONDS",
            env_raw("SWEEP_INTERVAL_SECONDS"),
            300,
        )?;

        let rate_limit_rps = env::var("RATE_LIMIT_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .unwrap_or(10);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            environment,
            port,
            challenge_ttl_seconds,
            session_ttl_seconds,
            sweep_interval_seconds,
            rate_limit_rps,
            cors_allowed_origins,
            log_level,
        })
    }
}

fn env_raw(var: &str) -> Option<String> {
    env::var(var).ok()
}

/// Parse an optional raw value into a positive integer, falling back to the
/// default when unset.
fn parse_positive(var: &str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let value = raw.parse::<i64>().map_err(|_| {
        ConfigError::InvalidValue(format!("{} must be an integer, got '{}'", var, raw))
    })?;

    if value <= 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be positive, got {}",
            var, value
        )));
    }

    Ok(value)
}
