pub mod extract;
pub mod policy;
pub mod verifier;

pub use extract::{RawCredentialSource, extract_token};
pub use policy::{CookieSource, HeaderSource, Policy, RawOptions};
pub use verifier::TokenVerifier;
