//! Configuration management for DeviceVault
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::collections::HashSet;
use std::env;
use std::net::IpAddr;
use thiserror::Error;

use crate::auth::SessionSecret;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Weak JWT_SECRET: must be at least 32 bytes and not a placeholder")]
    WeakSecret,
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
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

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Listen address
    pub bind_address: IpAddr,

    /// Server port
    pub port: u16,

    /// Database connection URL (in-memory storage when absent)
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Rate limit: requests per second per IP
    pub rate_limit_rps: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Session token signing secret
    pub jwt_secret: SessionSecret,

    /// Session token TTL in seconds (default: 604800 = 7 days)
    pub session_token_ttl_seconds: i64,

    /// Challenge TTL in seconds (default: 300 = 5 minutes)
    pub challenge_ttl_seconds: i64,

    /// Wallets refused at challenge time
    pub wallet_denylist: HashSet<String>,

    /// Wallets provisioned with the ADMIN role on first login
    pub admin_wallets: HashSet<String>,

    /// Wallets provisioned with the OPERATOR role on first login
    pub operator_wallets: HashSet<String>,

    /// Name shown in the challenge message
    pub app_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let bind_address = env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDRESS must be an IP address".into()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && environment.is_production() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        let rate_limit_rps = env::var("RATE_LIMIT_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u32>()
            .unwrap_or(100);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;
        let jwt_secret = SessionSecret::new(jwt_secret).map_err(|_| ConfigError::WeakSecret)?;

        let session_token_ttl_seconds = ttl_seconds(
            "SESSION_TOKEN_TTL_SECONDS",
            604_800,
            MAX_SESSION_TOKEN_TTL_SECONDS,
        )?;
        let challenge_ttl_seconds =
            ttl_seconds("CHALLENGE_TTL_SECONDS", 300, MAX_CHALLENGE_TTL_SECONDS)?;

        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "DeviceVault".to_string());

        Ok(Config {
            environment,
            bind_address,
            port,
            database_url,
            db_max_connections,
            rate_limit_rps,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            session_token_ttl_seconds,
            challenge_ttl_seconds,
            wallet_denylist: wallet_set("WALLET_DENYLIST"),
            admin_wallets: wallet_set("ADMIN_WALLETS"),
            operator_wallets: wallet_set("OPERATOR_WALLETS"),
            app_name,
        })
    }

    /// Get database URL (useful for logging masked version)
    pub fn database_url_masked(&self) -> Option<String> {
        self.database_url.as_deref().map(mask_url_password)
    }
}

fn mask_url_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // "postgresql://host@..." has no password; the colon belongs to the scheme
            if !url[..colon_pos].ends_with("postgresql") && !url[..colon_pos].ends_with("postgres")
            {
                return format!("{}****{}", &url[..colon_pos + 1], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}

/// Longest accepted session token lifetime (one year)
pub const MAX_SESSION_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Longest accepted challenge lifetime (one hour)
pub const MAX_CHALLENGE_TTL_SECONDS: i64 = 60 * 60;

fn ttl_seconds(var: &str, default: i64, max: i64) -> Result<i64, ConfigError> {
    parse_ttl(var, env::var(var).ok().as_deref(), default, max)
}

fn parse_ttl(var: &str, raw: Option<&str>, default: i64, max: i64) -> Result<i64, ConfigError> {
    let value = match raw {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} must be an integer", var)))?,
        None => default,
    };

    if value <= 0 || value > max {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds",
            var, max
        )));
    }

    Ok(value)
}

fn wallet_set(var: &str) -> HashSet<String> {
    env::var(var)
        .map(|s| parse_wallet_list(&s))
        .unwrap_or_default()
}

/// Parse a comma-separated wallet list, ignoring blanks
pub fn parse_wallet_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
