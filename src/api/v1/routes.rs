/*
 * Responsibility
 * - v1 URL layout
 * - Public routes (/health, /sessions) vs. routes behind the token gate (/me)
 */
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    health::health,
    sessions::{create_session, me, reset_me},
};
use crate::api::v1::state::ApiState;
use crate::middleware::auth::access;

pub fn routes(state: &ApiState) -> Router<ApiState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session));

    let Some(verifier) = state.app.verifier() else {
        tracing::warn!("auth pipeline disabled; /me routes are not mounted");
        return public;
    };

    let protected = Router::new()
        .route("/me", get(me))
        .route("/me/reset", post(reset_me));

    public.merge(access::apply(protected, Arc::clone(verifier)))
}
