use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by an account lookup (I/O, database, ...).
pub type FetchError = anyhow::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
    #[error("account id must not be empty")]
    EmptyAccountId,
}

/// Claims carried by every token the engine issues.
///
/// No `exp`: tokens are revoked by bumping the account's `last_token_reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
}

/// Three-way result of validating a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome<A> {
    Account(A),
    InvalidToken,
    AccountNotFound,
}

/// Accounts resolved by the engine expose when their tokens were last reset.
pub trait TokenAccount {
    /// Unix seconds. Tokens issued before this instant are rejected.
    fn last_token_reset(&self) -> i64 {
        0
    }
}

/// Resolves an account id (the token subject) to an application account.
///
/// The engine is passed in explicitly so lookups can reach its state (e.g. its clock).
#[async_trait]
pub trait AccountFetcher: Send + Sync + 'static {
    type Account: TokenAccount + Clone + Send + Sync + 'static;

    async fn fetch_account(
        &self,
        engine: &TokenEngine,
        account_id: &str,
    ) -> Result<Option<Self::Account>, FetchError>;
}

/// Adapts a synchronous closure into an [`AccountFetcher`].
pub struct FnFetcher<Fun, A> {
    fetch: Fun,
    _account: PhantomData<fn() -> A>,
}

impl<Fun, A> FnFetcher<Fun, A>
where
    Fun: Fn(&TokenEngine, &str) -> Option<A> + Send + Sync + 'static,
{
    pub fn new(fetch: Fun) -> Self {
        Self {
            fetch,
            _account: PhantomData,
        }
    }
}

#[async_trait]
impl<Fun, A> AccountFetcher for FnFetcher<Fun, A>
where
    Fun: Fn(&TokenEngine, &str) -> Option<A> + Send + Sync + 'static,
    A: TokenAccount + Clone + Send + Sync + 'static,
{
    type Account = A;

    async fn fetch_account(
        &self,
        engine: &TokenEngine,
        account_id: &str,
    ) -> Result<Option<A>, FetchError> {
        Ok((self.fetch)(engine, account_id))
    }
}

/// HS256 token engine: issues opaque bearer tokens and validates them against an
/// account lookup.
#[derive(Clone)]
pub struct TokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenEngine")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenEngine {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Current time on the engine's clock (unix seconds).
    pub fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub fn generate(&self, account_id: &str) -> Result<String, TokenError> {
        if account_id.is_empty() {
            return Err(TokenError::EmptyAccountId);
        }

        let claims = TokenClaims {
            sub: account_id.to_string(),
            iat: self.now(),
        };
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }

    /// Signature + structure check only; does not consult any account.
    pub fn decode(&self, token: &str) -> Option<TokenClaims> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
                .ok()?;

        if data.claims.sub.is_empty() {
            return None;
        }
        Some(data.claims)
    }

    /// Validate `token` and resolve its subject through `fetcher`.
    ///
    /// Only a failing lookup is an `Err`; a bad token is an `Ok(InvalidToken)`.
    pub async fn validate<F>(
        &self,
        token: &str,
        fetcher: &F,
    ) -> Result<ValidationOutcome<F::Account>, FetchError>
    where
        F: AccountFetcher + ?Sized,
    {
        let Some(claims) = self.decode(token) else {
            return Ok(ValidationOutcome::InvalidToken);
        };

        let Some(account) = fetcher.fetch_account(self, &claims.sub).await? else {
            return Ok(ValidationOutcome::AccountNotFound);
        };

        // Issued before the last reset: revoked
        if claims.iat < account.last_token_reset() {
            return Ok(ValidationOutcome::InvalidToken);
        }

        Ok(ValidationOutcome::Account(account))
    }
}
