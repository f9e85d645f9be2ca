/*
 * Responsibility
 * - Gate in front of protected routes: reset identity slot -> extract -> validate -> attach
 * - On failure, short-circuit with AuthError (the handler never runs)
 * - Authorization (what the account may do) stays in handlers/services
 */
//! Token verification → `Authenticated<Account>` in request extensions.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Authenticated;
use crate::error::AuthError;
use crate::services::auth::{RawCredentialSource, TokenVerifier};
use crate::services::token::AccountFetcher;

/// Put every route of `router` behind the token gate.
///
/// ```ignore
/// let protected = Router::new().route("/me", get(me));
/// let protected = middleware::auth::access::apply(protected, verifier);
/// app = app.merge(protected);
/// ```
pub fn apply<S, F>(router: Router<S>, verifier: Arc<TokenVerifier<F>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    F: AccountFetcher,
{
    router.layer(middleware::from_fn_with_state(
        verifier,
        access_middleware::<F>,
    ))
}

async fn access_middleware<F: AccountFetcher>(
    State(verifier): State<Arc<TokenVerifier<F>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // Never carry an identity over from a previous pass through the stack
    req.extensions_mut().remove::<Authenticated<F::Account>>();

    // Extraction is synchronous; keep header borrows out of the await below.
    let token = {
        let source = RawCredentialSource::from_headers(req.headers());
        verifier.extract(&source)
    };

    let account = match token {
        Ok(token) => verifier.validate(&token).await,
        Err(err) => Err(err),
    };

    match account {
        Ok(account) => {
            tracing::debug!(path = %req.uri().path(), "request authenticated");
            req.extensions_mut().insert(Authenticated(account));
            Ok(next.run(req).await)
        }
        Err(AuthError::Lookup(err)) => {
            tracing::error!(error = ?err, "account lookup failed");
            Err(AuthError::Lookup(err))
        }
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                path = %req.uri().path(),
                "authentication failed"
            );
            Err(err)
        }
    }
}
