use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;
use crate::services::auth::extract::{RawCredentialSource, extract_token};
use crate::services::auth::policy::Policy;
use crate::services::cookie::CookieUnsigner;
use crate::services::token::{AccountFetcher, TokenEngine, ValidationOutcome};

/// Request-time half of the pipeline: extract a candidate token, then validate it.
///
/// Holds no per-request state; one instance serves every request concurrently.
pub struct TokenVerifier<F: AccountFetcher> {
    policy: Policy,
    engine: Arc<TokenEngine>,
    fetcher: Arc<F>,
    unsigner: Option<Arc<dyn CookieUnsigner>>,
}

impl<F: AccountFetcher> fmt::Debug for TokenVerifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("policy", &self.policy)
            .field("engine", &self.engine)
            .field("signed_cookies", &self.unsigner.is_some())
            .finish()
    }
}

impl<F: AccountFetcher> TokenVerifier<F> {
    pub fn new(
        policy: Policy,
        engine: Arc<TokenEngine>,
        fetcher: Arc<F>,
        unsigner: Option<Arc<dyn CookieUnsigner>>,
    ) -> Self {
        Self {
            policy,
            engine,
            fetcher,
            unsigner,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn engine(&self) -> &Arc<TokenEngine> {
        &self.engine
    }

    /// Candidate token for this request, or `NoTokenFound`.
    pub fn extract(&self, source: &RawCredentialSource<'_>) -> Result<String, AuthError> {
        extract_token(&self.policy, source, self.unsigner.as_deref())
            .ok_or(AuthError::NoTokenFound)
    }

    /// Validate an already-extracted token.
    pub async fn validate(&self, token: &str) -> Result<F::Account, AuthError> {
        match self
            .engine
            .validate(token, self.fetcher.as_ref())
            .await
            .map_err(AuthError::Lookup)?
        {
            ValidationOutcome::Account(account) => Ok(account),
            ValidationOutcome::InvalidToken => Err(AuthError::InvalidToken),
            ValidationOutcome::AccountNotFound => Err(AuthError::AccountNotFound),
        }
    }

    pub async fn authenticate(
        &self,
        source: &RawCredentialSource<'_>,
    ) -> Result<F::Account, AuthError> {
        let token = self.extract(source)?;
        self.validate(&token).await
    }
}
