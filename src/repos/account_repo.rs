/*
 * Responsibility
 * - In-memory account store for the demo server
 * - Resolves token subjects (AccountFetcher) and records token resets
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::services::token::{AccountFetcher, FetchError, TokenAccount, TokenEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: String,
    pub last_token_reset: i64,
}

impl TokenAccount for Account {
    fn last_token_reset(&self) -> i64 {
        self.last_token_reset
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountRepo {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl AccountRepo {
    pub fn seeded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accounts = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                let account = Account {
                    id: id.clone(),
                    last_token_reset: 0,
                };
                (id, account)
            })
            .collect();

        Self {
            accounts: Arc::new(RwLock::new(accounts)),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Account> {
        self.accounts.read().await.get(id).cloned()
    }

    /// Stamp `at` as the last token reset; tokens issued earlier stop validating.
    pub async fn reset_tokens(&self, id: &str, at: i64) -> Option<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(id)?;
        account.last_token_reset = at;
        Some(account.clone())
    }
}

#[async_trait]
impl AccountFetcher for AccountRepo {
    type Account = Account;

    async fn fetch_account(
        &self,
        _engine: &TokenEngine,
        account_id: &str,
    ) -> Result<Option<Account>, FetchError> {
        Ok(self.get(account_id).await)
    }
}
