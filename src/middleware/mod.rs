/*
 * Responsibility
 * - middleware public interface
 * - auth::access (token gate), http (request id / tracing / limits)
 */
pub mod auth;
pub mod http;
