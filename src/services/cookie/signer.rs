use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
use sha2::{Digest, Sha512};

use crate::config::ConfigError;

/// Unwraps a signed cookie value. `None` means the signature did not verify.
///
/// The cookie name is part of what is signed, so it is passed along.
pub trait CookieUnsigner: Send + Sync {
    fn unsign(&self, name: &str, signed: &str) -> Option<String>;
}

/// Signing key shared with axum-extra's `SignedCookieJar`.
#[derive(Clone)]
pub struct SignedCookieKey {
    key: Key,
}

impl std::fmt::Debug for SignedCookieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookieKey").finish_non_exhaustive()
    }
}

impl SignedCookieKey {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Invalid("cookie secret"));
        }
        // Key needs exactly 64 bytes of material
        let material = Sha512::digest(secret.as_bytes());

        Ok(Self {
            key: Key::from(material.as_slice()),
        })
    }

    /// Empty jar; cookies added to it are signed when the response is built.
    pub fn jar(&self) -> SignedCookieJar {
        SignedCookieJar::new(self.key.clone())
    }

    /// Wire form of a signed cookie value, as a client would send it back.
    pub fn sign(&self, name: &str, value: &str) -> Option<String> {
        let response = self
            .jar()
            .add(Cookie::new(name.to_string(), value.to_string()))
            .into_response();

        let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
        let pair = set_cookie.split(';').next()?;
        pair.strip_prefix(name)?.strip_prefix('=').map(str::to_string)
    }
}

impl CookieUnsigner for SignedCookieKey {
    fn unsign(&self, name: &str, signed: &str) -> Option<String> {
        let pair = HeaderValue::from_str(&format!("{name}={signed}")).ok()?;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, pair);

        SignedCookieJar::from_headers(&headers, self.key.clone())
            .get(name)
            .map(|cookie| cookie.value().to_string())
    }
}
