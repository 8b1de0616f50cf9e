//! Middleware components
//!
//! Currently only the bearer token presence check for protected routes.

pub mod auth;

pub use auth::{auth_middleware, AuthError};
