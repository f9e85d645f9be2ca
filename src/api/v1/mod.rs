/*
 * Responsibility
 * - v1 public surface (routes(), extractors, state)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;
pub mod state;

pub use routes::routes;
pub use state::ApiState;
