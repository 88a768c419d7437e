//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Store
//! - `LOCALBITE_STORE` - `postgres` (default) or `memory`
//! - `LOCALBITE_DATABASE_URL` - `PostgreSQL` connection string (required for
//!   `postgres`; falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `LOCALBITE_HOST` - Bind address (default: 127.0.0.1)
//! - `LOCALBITE_PORT` - Listen port (default: 3000)
//! - `LOCALBITE_CORS_ORIGINS` - Comma-separated allowed origins
//!   (default: `http://localhost:5173`)
//! - `LOCALBITE_ADMIN_GATE` - Require an admin `x-user-uid` on admin routes
//!   (default: false)
//! - `LOCALBITE_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where documents are persisted.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` via a connection pool.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// Process-local store. Data is lost on restart.
    Memory,
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Persistence backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Whether admin-only routes require an admin identity
    pub admin_gate: bool,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let store = match env.or_default("LOCALBITE_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env.database_url("LOCALBITE_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOCALBITE_STORE".to_string(),
                    format!("expected `postgres` or `memory`, got `{other}`"),
                ));
            }
        };

        let host = env
            .or_default("LOCALBITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOCALBITE_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("LOCALBITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOCALBITE_PORT".to_string(), e.to_string()))?;

        let cors_origins = parse_origins(&env.or_default("LOCALBITE_CORS_ORIGINS", DEFAULT_CORS_ORIGIN))?;
        let admin_gate = env
            .optional("LOCALBITE_ADMIN_GATE")
            .map(|v| parse_bool("LOCALBITE_ADMIN_GATE", &v))
            .transpose()?
            .unwrap_or(false);
        let log_json = env.optional("LOCALBITE_LOG_JSON").is_some();

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env.rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = env.rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            store,
            host,
            port,
            cors_origins,
            admin_gate,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for an in-memory API with defaults everywhere else.
    ///
    /// Used by local tooling and tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            admin_gate: false,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Thin wrapper over the lookup closure.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional, non-blank variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to the generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        let (key, value) = match self.optional(primary_key) {
            Some(value) => (primary_key, value),
            None => (
                "DATABASE_URL",
                self.optional("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))?,
            ),
        };
        let secret = SecretString::from(value);
        validate_database_url(&secret, key)?;
        Ok(secret)
    }

    /// Get a sample rate in `0.0..=1.0`.
    fn rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        let rate = raw
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ));
        }
        Ok(rate)
    }
}

/// Validate that a database URL is a `PostgreSQL` URL without echoing it.
fn validate_database_url(url: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url.expose_secret()).map_err(|e| {
        ConfigError::InvalidEnvVar(var_name.to_string(), format!("not a valid URL: {e}"))
    })?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(()),
        scheme => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme `{scheme}`, expected postgres"),
        )),
    }
}

/// Parse a comma-separated origin list; each entry must be an absolute URL.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            let url = Url::parse(origin).map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "LOCALBITE_CORS_ORIGINS".to_string(),
                    format!("`{origin}`: {e}"),
                )
            })?;
            Ok(url.origin().ascii_serialization())
        })
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got `{other}`"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "LOCALBITE_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://app:pw@db:5432/localbite")]).unwrap();
        match config.store {
            StoreBackend::Postgres { database_url } => {
                assert_eq!(database_url.expose_secret(), "postgres://app:pw@db:5432/localbite");
            }
            StoreBackend::Memory => panic!("expected postgres backend"),
        }
    }

    #[test]
    fn test_database_url_scheme_checked() {
        let err = load(&[("LOCALBITE_DATABASE_URL", "mongodb://localhost/localbite")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        // The URL itself must not leak into the message
        assert!(!err.to_string().contains("localhost"));
    }

    #[test]
    fn test_memory_defaults() {
        let config = load(&[("LOCALBITE_STORE", "memory")]).unwrap();
        assert!(matches!(config.store, StoreBackend::Memory));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert!(!config.admin_gate);
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_unknown_store_rejected() {
        let err = load(&[("LOCALBITE_STORE", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "LOCALBITE_STORE"));
    }

    #[test]
    fn test_host_port_overrides() {
        let config = load(&[
            ("LOCALBITE_STORE", "memory"),
            ("LOCALBITE_HOST", "0.0.0.0"),
            ("LOCALBITE_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");

        assert!(load(&[("LOCALBITE_STORE", "memory"), ("LOCALBITE_PORT", "70000")]).is_err());
    }

    #[test]
    fn test_cors_origins_normalized() {
        let config = load(&[
            ("LOCALBITE_STORE", "memory"),
            (
                "LOCALBITE_CORS_ORIGINS",
                "https://localbite.app/, http://localhost:5173 ,",
            ),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec![
                "https://localbite.app".to_string(),
                "http://localhost:5173".to_string()
            ]
        );

        assert!(load(&[("LOCALBITE_STORE", "memory"), ("LOCALBITE_CORS_ORIGINS", "not a url")]).is_err());
    }

    #[test]
    fn test_admin_gate_flag() {
        let on = load(&[("LOCALBITE_STORE", "memory"), ("LOCALBITE_ADMIN_GATE", "TRUE")]).unwrap();
        assert!(on.admin_gate);
        let off = load(&[("LOCALBITE_STORE", "memory"), ("LOCALBITE_ADMIN_GATE", "off")]).unwrap();
        assert!(!off.admin_gate);
        assert!(load(&[("LOCALBITE_STORE", "memory"), ("LOCALBITE_ADMIN_GATE", "maybe")]).is_err());
    }

    #[test]
    fn test_sample_rates() {
        let config = load(&[
            ("LOCALBITE_STORE", "memory"),
            ("SENTRY_SAMPLE_RATE", "0.5"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.1"),
        ])
        .unwrap();
        assert!((config.sentry_sample_rate - 0.5).abs() < f32::EPSILON);
        assert!((config.sentry_traces_sample_rate - 0.1).abs() < f32::EPSILON);

        assert!(load(&[("LOCALBITE_STORE", "memory"), ("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("LOCALBITE_DATABASE_URL", "postgres://app:hunter2@db/localbite")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
