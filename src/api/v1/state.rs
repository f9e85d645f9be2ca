/*
 * Responsibility
 * - Router state for the demo v1 API
 * - Registered tokenize state + the account store + optional cookie signer
 */
use crate::repos::account_repo::AccountRepo;
use crate::services::cookie::SignedCookieKey;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct ApiState {
    pub app: AppState<AccountRepo>,
    pub accounts: AccountRepo,
    pub cookie_signer: Option<SignedCookieKey>,
}

impl ApiState {
    pub fn new(
        app: AppState<AccountRepo>,
        accounts: AccountRepo,
        cookie_signer: Option<SignedCookieKey>,
    ) -> Self {
        Self {
            app,
            accounts,
            cookie_signer,
        }
    }
}
