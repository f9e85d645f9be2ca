mod core;
mod types;

pub use self::core::CurrentAccount;
pub use self::types::Authenticated;
