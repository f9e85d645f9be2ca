/*
 * Responsibility
 * - Raw registration options as they arrive from a document or the environment
 * - Normalize them once into an immutable Policy (where to look for a token, and how)
 */
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::ConfigError;

pub const DEFAULT_COOKIE_NAME: &str = "token";

/// Registration options before any validation.
///
/// Loosely-typed fields are kept as `Value` so shape errors (`cookie: 69`) surface as
/// `ConfigError` at setup instead of a deserialization failure. Every field
/// distinguishes "absent" (`None`) from an explicit `null` (`Some(Value::Null)`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptions {
    #[serde(default, deserialize_with = "present")]
    pub secret: Option<Value>,
    #[serde(default, alias = "fastifyAuth", deserialize_with = "present")]
    pub auth: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub cookie: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub header: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub cookie_signed: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RawOptions {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(Value::String(secret.into())),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, enabled: bool) -> Self {
        self.auth = Some(Value::Bool(enabled));
        self
    }

    pub fn with_cookie(mut self, cookie: Value) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn with_header(mut self, header: Value) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_cookie_signed(mut self, signed: Value) -> Self {
        self.cookie_signed = Some(signed);
        self
    }

    pub fn from_json_str(doc: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(doc).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Read `TOKENIZE_*` variables. `false`, `true` and `null` are taken literally.
    /// `.env` loading is left to the caller.
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("TOKENIZE_SECRET").ok().map(Value::String),
            auth: env_value("TOKENIZE_AUTH"),
            cookie: env_value("TOKENIZE_COOKIE"),
            header: env_value("TOKENIZE_HEADER"),
            cookie_signed: env_value("TOKENIZE_COOKIE_SIGNED"),
        }
    }

    /// The secret used to build the token engine.
    pub fn secret(&self) -> Result<&str, ConfigError> {
        match &self.secret {
            None | Some(Value::Null) => Err(ConfigError::SecretRequired),
            Some(Value::String(s)) if s.is_empty() => Err(ConfigError::SecretRequired),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ConfigError::SecretNotString),
        }
    }

    pub fn auth_enabled(&self) -> Result<bool, ConfigError> {
        match &self.auth {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ConfigError::InvalidAuthFlag),
        }
    }
}

fn env_value(key: &str) -> Option<Value> {
    std::env::var(key).ok().map(|s| match s.as_str() {
        "false" => Value::Bool(false),
        "true" => Value::Bool(true),
        "null" => Value::Null,
        _ => Value::String(s),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    Named(String),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSource {
    /// The whole header value is the token.
    Raw,
    /// `<scheme> <token>`, scheme compared case-sensitively.
    Scheme(String),
    Disabled,
}

/// Where and how to look for a credential. Built once, shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    cookie: CookieSource,
    cookie_signed: bool,
    header: HeaderSource,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            cookie: CookieSource::Named(DEFAULT_COOKIE_NAME.to_string()),
            cookie_signed: false,
            header: HeaderSource::Raw,
        }
    }
}

impl Policy {
    pub fn resolve(raw: &RawOptions) -> Result<Self, ConfigError> {
        let cookie = match &raw.cookie {
            None => CookieSource::Named(DEFAULT_COOKIE_NAME.to_string()),
            Some(Value::Bool(false)) => CookieSource::Disabled,
            Some(Value::String(name)) if !name.is_empty() => CookieSource::Named(name.clone()),
            Some(_) => return Err(ConfigError::InvalidCookie),
        };

        let header = match &raw.header {
            None | Some(Value::Null) => HeaderSource::Raw,
            Some(Value::Bool(false)) => HeaderSource::Disabled,
            Some(Value::String(scheme)) if !scheme.is_empty() => {
                HeaderSource::Scheme(scheme.clone())
            }
            Some(_) => return Err(ConfigError::InvalidHeader),
        };

        let cookie_signed = match &raw.cookie_signed {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(ConfigError::InvalidCookieSigned),
        };

        if cookie == CookieSource::Disabled && header == HeaderSource::Disabled {
            return Err(ConfigError::BothSourcesDisabled);
        }

        Ok(Self {
            cookie,
            cookie_signed,
            header,
        })
    }

    pub fn cookie(&self) -> &CookieSource {
        &self.cookie
    }

    pub fn cookie_signed(&self) -> bool {
        self.cookie_signed
    }

    pub fn header(&self) -> &HeaderSource {
        &self.header
    }
}
