//! API routes and handlers
//!
//! Handlers are thin adapters: they parse path and query parameters and
//! hand everything else to the services.

use axum::{routing::get, Router};
use uuid::Uuid;

use crate::{utils::AppError, AppState};

mod bids;
mod health;
mod tenders;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}

/// Protected API routes (bearer token required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/tenders", tenders::routes())
        .nest("/bids", bids::routes())
}

/// Parse a path identifier, naming the entity in the error
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("Invalid {} ID", entity)))
}
