//! Bearer-token authentication gate for axum.
//!
//! A request's token is looked up in a cookie (optionally signed) and then in the
//! `Authorization` header, validated by [`TokenEngine`], and resolved to an
//! application account through an [`AccountFetcher`]. The account lands in the
//! request extensions as [`Authenticated`]; failures are typed as [`AuthError`].
//!
//! ```ignore
//! let mut builder = AppState::builder();
//! builder.register(
//!     TokenizeOptions::new(RawOptions::new("secret").with_auth(true)).fetch_account(repo),
//! )?;
//! let state = builder.build()?;
//! let verifier = state.verifier().unwrap().clone();
//! let protected = middleware::auth::access::apply(protected, verifier);
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;

pub use api::v1::extractors::{Authenticated, CurrentAccount};
pub use config::ConfigError;
pub use error::AuthError;
pub use services::auth::{
    CookieSource, HeaderSource, Policy, RawCredentialSource, RawOptions, TokenVerifier,
};
pub use services::cookie::{CookieUnsigner, SignedCookieKey};
pub use services::token::{
    AccountFetcher, FetchError, FnFetcher, TokenAccount, TokenEngine, ValidationOutcome,
};
pub use state::{AppState, AppStateBuilder, TokenizeOptions};
