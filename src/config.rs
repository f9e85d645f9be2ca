/*
 * Responsibility
 * - Setup-time errors (ConfigError) shared by the resolver and the demo server
 * - Demo server settings from the environment (PORT, APP_ENV, COOKIE_SECRET, DEMO_ACCOUNTS,
 *   HTTP_BODY_LIMIT_BYTES, HTTP_TIMEOUT_SECS)
 * - Missing/invalid values fail startup before any request is served
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::auth::RawOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::Invalid("APP_ENV")),
        }
    }
}

impl AppEnv {
    /// Unset means development; an unknown value is a startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("APP_ENV") {
            Ok(s) => s.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Development aborts on panic so a broken handler can't go unnoticed.
    pub fn abort_on_panic(&self) -> bool {
        !self.is_production()
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> String {
        let krate = env!("CARGO_CRATE_NAME");
        match self {
            Self::Development => format!("info,{krate}=debug,tower_http=debug"),
            Self::Production => format!("warn,{krate}=info,tower_http=info"),
        }
    }
}

/// Limits for the outer HTTP layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub body_limit_bytes: usize,
    /// Covers the whole request, account lookup included.
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            // Token requests are tiny
            body_limit_bytes: 64 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpSettings {
    /// `HTTP_BODY_LIMIT_BYTES`, `HTTP_TIMEOUT_SECS`; both must be positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let body_limit_bytes = match std::env::var("HTTP_BODY_LIMIT_BYTES") {
            Ok(s) => {
                parse_positive(&s).ok_or(ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?
            }
            Err(_) => defaults.body_limit_bytes,
        };

        let request_timeout = match std::env::var("HTTP_TIMEOUT_SECS") {
            Ok(s) => parse_positive(&s)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("HTTP_TIMEOUT_SECS"))?,
            Err(_) => defaults.request_timeout,
        };

        Ok(Self {
            body_limit_bytes,
            request_timeout,
        })
    }
}

fn parse_positive<T: FromStr + PartialOrd + Default>(s: &str) -> Option<T> {
    s.trim().parse().ok().filter(|v| *v > T::default())
}

/// Every failure that can happen before the first request is accepted.
///
/// None of these are recoverable: the host must not start serving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`secret` parameter is mandatory")]
    SecretRequired,
    #[error("`secret` parameter must be a string")]
    SecretNotString,
    #[error("`auth` parameter must be a boolean")]
    InvalidAuthFlag,
    #[error("tokenize has already been registered")]
    AlreadyRegistered,
    #[error("`fetch_account` is mandatory when the auth pipeline is enabled")]
    FetchAccountRequired,
    #[error("`cookie` parameter must be either a string or false")]
    InvalidCookie,
    #[error("`header` parameter must be either a string, null or false")]
    InvalidHeader,
    #[error("`cookieSigned` parameter must be a boolean")]
    InvalidCookieSigned,
    #[error("cannot disable both cookie and header lookup")]
    BothSourcesDisabled,
    #[error("a cookie unsigner is mandatory when `cookieSigned` is true")]
    CookieUnsignerRequired,
    #[error("invalid options document: {0}")]
    Malformed(String),
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub http: HttpSettings,

    pub tokenize: RawOptions,
    // Key for signed cookies; only required when `TOKENIZE_COOKIE_SIGNED=true`
    pub cookie_secret: Option<String>,

    pub demo_accounts: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env()?;
        let http = HttpSettings::from_env()?;

        let tokenize = RawOptions::from_env();

        let cookie_secret = std::env::var("COOKIE_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let demo_accounts = std::env::var("DEMO_ACCOUNTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            addr,
            app_env,
            http,
            tokenize,
            cookie_secret,
            demo_accounts,
        })
    }
}
