/*
 * Responsibility
 * - /sessions and /me request/response DTOs
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub account_id: String,
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.account_id.trim().is_empty() {
            return Err("account_id is required");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub last_token_reset: i64,
}
