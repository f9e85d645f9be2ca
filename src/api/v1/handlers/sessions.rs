/*
 * Responsibility
 * - POST /sessions: issue a token through the engine handle (login stand-in)
 * - GET /me, POST /me/reset: gated; read the account attached by the token gate
 */
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite, SignedCookieJar};

use crate::{
    api::v1::{
        dto::sessions::{AccountResponse, CreateSessionRequest, SessionResponse},
        extractors::CurrentAccount,
        state::ApiState,
    },
    error::AppError,
    repos::account_repo::Account,
    services::auth::CookieSource,
};

pub async fn create_session(
    State(api): State<ApiState>,
    jar: CookieJar,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, CookieJar, Option<SignedCookieJar>, Json<SessionResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    api.accounts
        .get(&req.account_id)
        .await
        .ok_or(AppError::not_found("account"))?;

    let token = api.app.tokenize().generate(&req.account_id).map_err(|e| {
        tracing::error!(error = %e, "failed to issue token");
        AppError::Internal
    })?;

    // Mirror the gate's cookie policy so browsers can authenticate without the header
    let policy = api.app.verifier().map(|v| v.policy());
    let (jar, signed) = match policy {
        Some(policy) => match policy.cookie() {
            CookieSource::Named(name) => {
                let cookie = Cookie::build((name.clone(), token.clone()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax);

                match (&api.cookie_signer, policy.cookie_signed()) {
                    (Some(signer), true) => (jar, Some(signer.jar().add(cookie))),
                    _ => (jar.add(cookie), None),
                }
            }
            CookieSource::Disabled => (jar, None),
        },
        None => (jar, None),
    };

    tracing::info!(account_id = %req.account_id, "token issued");

    Ok((
        StatusCode::CREATED,
        jar,
        signed,
        Json(SessionResponse {
            token,
            token_type: "Tokenize",
        }),
    ))
}

pub async fn me(CurrentAccount(account): CurrentAccount<Account>) -> Json<AccountResponse> {
    Json(AccountResponse {
        id: account.id,
        last_token_reset: account.last_token_reset,
    })
}

pub async fn reset_me(
    State(api): State<ApiState>,
    CurrentAccount(account): CurrentAccount<Account>,
) -> Result<StatusCode, AppError> {
    let now = api.app.tokenize().now();
    api.accounts
        .reset_tokens(&account.id, now)
        .await
        .ok_or(AppError::not_found("account"))?;

    tracing::info!(account_id = %account.id, "tokens reset");
    Ok(StatusCode::NO_CONTENT)
}
