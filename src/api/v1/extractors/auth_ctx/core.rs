use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use super::Authenticated;

/// Handler-side access to the account attached by the token gate.
/// Missing means the route is not behind the gate: 401.
pub struct CurrentAccount<A>(pub A);

impl<S, A> FromRequestParts<S> for CurrentAccount<A>
where
    S: Send + Sync,
    A: Clone + Send + Sync + 'static,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated<A>>()
            .map(|a| CurrentAccount(a.0.clone()))
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
