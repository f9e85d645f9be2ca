pub mod signer;

pub use signer::{CookieUnsigner, SignedCookieKey};
