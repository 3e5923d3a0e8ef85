//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use bizops_observability::LogFormat;

use crate::rate_limit::RateLimitPolicy;

const DEV_JWT_SECRET: &str = "dev-secret";

/// Deployment environment. Only development exposes internal error detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub environment: Environment,
    pub rate_limit: RateLimitPolicy,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            environment: Environment::Production,
            rate_limit: RateLimitPolicy::default(),
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// True when no `JWT_SECRET` was supplied and the insecure default is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    ///
    /// Variables: `BIND_ADDR`, `JWT_SECRET`, `APP_ENV`, `RATE_LIMIT_MAX`,
    /// `RATE_LIMIT_WINDOW_SECS`, `LOG_FORMAT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("BIND_ADDR") {
            config.bind_addr = v
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::invalid("BIND_ADDR", &v, e.to_string()))?;
        }

        if let Some(v) = lookup("APP_ENV") {
            config.environment = match v.trim().to_ascii_lowercase().as_str() {
                "development" | "dev" => Environment::Development,
                "production" | "prod" => Environment::Production,
                _ => return Err(ConfigError::invalid("APP_ENV", &v, "expected development or production")),
            };
        }

        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            config.jwt_secret = secret;
        }

        if let Some(v) = lookup("RATE_LIMIT_MAX") {
            config.rate_limit.max_requests = match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::invalid("RATE_LIMIT_MAX", &v, "expected a positive integer")),
            };
        }

        if let Some(v) = lookup("RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit.window = match v.trim().parse::<i64>() {
                Ok(n) if n > 0 => Duration::seconds(n),
                _ => {
                    return Err(ConfigError::invalid(
                        "RATE_LIMIT_WINDOW_SECS",
                        &v,
                        "expected a positive number of seconds",
                    ));
                }
            };
        }

        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = v
                .parse()
                .map_err(|reason: String| ConfigError::invalid("LOG_FORMAT", &v, reason))?;
        }

        Ok(config)
    }
}
