//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and never mutated afterwards.

use axum_extra::extract::cookie::SameSite;
use std::env;
use std::time::Duration;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:4200";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Session cookies live for seven days.
pub const SESSION_COOKIE_MAX_AGE: time::Duration = time::Duration::days(7);

/// Deployment environment. Only affects cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("development") => Environment::Development,
            _ => Environment::Production,
        }
    }
}

/// Which backend serves the store traits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted platform: `{url}/auth/v1` and `{url}/rest/v1`.
    Supabase { url: String, service_key: String },
    /// In-process store, for tests and offline development.
    Memory,
}

/// Attributes applied to both session cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age: time::Duration,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Origins allowed by CORS (exact match)
    pub allowed_origins: Vec<String>,
    /// Server port
    pub port: u16,
    pub backend: StoreBackend,
    /// Upper bound on every store call
    pub store_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(
            lookup("APP_ENV")
                .or_else(|| lookup("NODE_ENV"))
                .as_deref(),
        );

        let allowed_origins = parse_origins(
            &lookup("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        );

        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let store_timeout = Duration::from_secs(
            lookup("STORE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
        );

        let backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("supabase") => StoreBackend::Supabase {
                url: lookup("BACKEND_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .ok_or(ConfigError::Missing("BACKEND_URL"))?,
                service_key: lookup("BACKEND_SERVICE_KEY")
                    .map(|v| v.trim().to_string())
                    .ok_or(ConfigError::Missing("BACKEND_SERVICE_KEY"))?,
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            environment,
            allowed_origins,
            port,
            backend,
            store_timeout,
        })
    }

    /// Config for tests: development cookies, in-memory store.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            allowed_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
            port: DEFAULT_PORT,
            backend: StoreBackend::Memory,
            store_timeout: Duration::from_secs(5),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Localhost frontends cannot use `Secure` cookies; cross-site
    /// production frontends need `SameSite=None`.
    pub fn cookie_policy(&self) -> CookiePolicy {
        if self.is_development() {
            CookiePolicy {
                secure: false,
                same_site: SameSite::Lax,
                max_age: SESSION_COOKIE_MAX_AGE,
            }
        } else {
            CookiePolicy {
                secure: true,
                same_site: SameSite::None,
                max_age: SESSION_COOKIE_MAX_AGE,
            }
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
