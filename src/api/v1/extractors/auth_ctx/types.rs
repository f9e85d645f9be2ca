/*
 * Responsibility
 * - The identity slot the gate fills in request extensions
 * - Handlers never see tokens, only the resolved account
 */

/// Account resolved by the token gate for the current request.
///
/// Inserted fresh on every request; the gate removes any earlier value first.
#[derive(Debug, Clone)]
pub struct Authenticated<A>(pub A);

impl<A> Authenticated<A> {
    pub fn into_inner(self) -> A {
        self.0
    }
}
