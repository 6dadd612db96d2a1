//! Request authentication for Axum handlers.

pub mod auth;
pub mod error;

pub use auth::{AuthState, BearerAuth, require_any_role};
