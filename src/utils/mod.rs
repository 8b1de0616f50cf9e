//! Shared helpers for the HTTP layer

pub mod error;
pub mod validation;

pub use error::{AppError, AppResult, ErrorResponse};
