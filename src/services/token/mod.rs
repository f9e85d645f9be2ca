pub mod engine;

pub use engine::{
    AccountFetcher, FetchError, FnFetcher, TokenAccount, TokenClaims, TokenEngine, TokenError,
    ValidationOutcome,
};
