/*
 * Responsibility
 * - Registration: raw options + collaborators -> token engine (+ verifier when auth is on)
 * - Guard against registering twice on the same host
 * - Shared context for the Router (AppState); Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::ConfigError;
use crate::services::auth::{CookieSource, Policy, RawOptions, TokenVerifier};
use crate::services::cookie::CookieUnsigner;
use crate::services::token::{AccountFetcher, TokenEngine};

/// Everything `register` needs: the raw options plus the code-level collaborators.
pub struct TokenizeOptions<F> {
    pub raw: RawOptions,
    pub fetch_account: Option<Arc<F>>,
    pub cookie_unsigner: Option<Arc<dyn CookieUnsigner>>,
}

impl<F> TokenizeOptions<F> {
    pub fn new(raw: RawOptions) -> Self {
        Self {
            raw,
            fetch_account: None,
            cookie_unsigner: None,
        }
    }

    pub fn fetch_account(mut self, fetcher: F) -> Self {
        self.fetch_account = Some(Arc::new(fetcher));
        self
    }

    pub fn cookie_unsigner(mut self, unsigner: Arc<dyn CookieUnsigner>) -> Self {
        self.cookie_unsigner = Some(unsigner);
        self
    }
}

pub struct AppState<F: AccountFetcher> {
    tokenize: Arc<TokenEngine>,
    verifier: Option<Arc<TokenVerifier<F>>>,
}

impl<F: AccountFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            tokenize: Arc::clone(&self.tokenize),
            verifier: self.verifier.clone(),
        }
    }
}

impl<F: AccountFetcher> std::fmt::Debug for AppState<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokenize", &self.tokenize)
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl<F: AccountFetcher> AppState<F> {
    pub fn builder() -> AppStateBuilder<F> {
        AppStateBuilder { registered: None }
    }

    /// Handle to the token engine, for issuing tokens (login endpoints, etc.).
    pub fn tokenize(&self) -> &Arc<TokenEngine> {
        &self.tokenize
    }

    /// The request gate; `None` unless the auth pipeline was enabled.
    pub fn verifier(&self) -> Option<&Arc<TokenVerifier<F>>> {
        self.verifier.as_ref()
    }
}

pub struct AppStateBuilder<F: AccountFetcher> {
    registered: Option<AppState<F>>,
}

impl<F: AccountFetcher> AppStateBuilder<F> {
    pub fn register(&mut self, options: TokenizeOptions<F>) -> Result<&mut Self, ConfigError> {
        let TokenizeOptions {
            raw,
            fetch_account,
            cookie_unsigner,
        } = options;

        let secret = raw.secret()?;

        if self.registered.is_some() {
            return Err(ConfigError::AlreadyRegistered);
        }

        let tokenize = Arc::new(TokenEngine::new(secret));

        let verifier = if raw.auth_enabled()? {
            let fetcher = fetch_account.ok_or(ConfigError::FetchAccountRequired)?;
            let policy = Policy::resolve(&raw)?;

            // A disabled cookie source never reads a signed value
            let reads_signed = policy.cookie_signed()
                && matches!(policy.cookie(), CookieSource::Named(_));
            let unsigner = if reads_signed {
                Some(cookie_unsigner.ok_or(ConfigError::CookieUnsignerRequired)?)
            } else {
                None
            };

            Some(Arc::new(TokenVerifier::new(
                policy,
                Arc::clone(&tokenize),
                fetcher,
                unsigner,
            )))
        } else {
            None
        };

        tracing::debug!(auth = verifier.is_some(), "tokenize registered");
        self.registered = Some(AppState { tokenize, verifier });
        Ok(self)
    }

    pub fn build(self) -> Result<AppState<F>, ConfigError> {
        self.registered.ok_or(ConfigError::SecretRequired)
    }
}
