/*
 * Responsibility
 * - Config load -> tokenize registration -> Router assembly
 * - HTTP middleware (request id / tracing / limits)
 * - axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::ApiState};
use crate::config::{AppEnv, Config, ConfigError, HttpSettings};
use crate::middleware;
use crate::repos::account_repo::AccountRepo;
use crate::services::cookie::SignedCookieKey;
use crate::state::{AppState, TokenizeOptions};

fn init_tracing(app_env: AppEnv) {
    // RUST_LOG overrides the per-environment default
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(app_env.default_log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!app_env.is_production())
                .with_target(!app_env.is_production()),
        )
        .init();
}

fn init_panic_hook(app_env: AppEnv) {
    let default_hook = panic::take_hook();
    let abort = app_env.abort_on_panic();

    panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line()));

        tracing::error!(payload, location = location.as_deref().unwrap_or("-"), "panic");

        if abort {
            process::abort();
        }
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.app_env);
    init_panic_hook(config.app_env);

    tracing::info!(
        "starting tokenize demo in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config.http);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config) -> Result<ApiState, ConfigError> {
    let accounts = AccountRepo::seeded(config.demo_accounts.iter().cloned());

    let cookie_signer = config
        .cookie_secret
        .as_deref()
        .map(SignedCookieKey::new)
        .transpose()?;

    let mut options =
        TokenizeOptions::new(config.tokenize.clone()).fetch_account(accounts.clone());
    if let Some(signer) = &cookie_signer {
        options = options.cookie_unsigner(Arc::new(signer.clone()));
    }

    let mut builder = AppState::builder();
    builder.register(options)?;
    let app = builder.build()?;

    Ok(ApiState::new(app, accounts, cookie_signer))
}

pub fn build_router(state: ApiState, http: &HttpSettings) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    middleware::http::apply(router, http)
}
