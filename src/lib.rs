//! Tender API Library
//!
//! Procurement marketplace backend: organizations publish tenders, users and
//! organizations bid on them, and every edit keeps a restorable history.

use std::sync::Arc;

use axum::Router;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::auth_middleware;
pub use services::{BidService, TenderService};

use db::{
    SqliteBidRepository, SqliteOrganizationRepository, SqliteTenderRepository,
    SqliteUserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
    pub tenders: Arc<TenderService>,
    pub bids: Arc<BidService>,
}

impl AppState {
    /// Wire the services over SQLite repositories sharing one pool
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let tender_repo = Arc::new(SqliteTenderRepository::new(db.clone()));
        let bid_repo = Arc::new(SqliteBidRepository::new(db.clone()));
        let user_repo = Arc::new(SqliteUserRepository::new(db.clone()));
        let org_repo = Arc::new(SqliteOrganizationRepository::new(db.clone()));

        let tenders = Arc::new(TenderService::new(
            tender_repo.clone(),
            user_repo.clone(),
            org_repo.clone(),
            config.lifecycle.clone(),
        ));
        let bids = Arc::new(BidService::new(
            bid_repo,
            tender_repo,
            user_repo,
            org_repo,
            config.lifecycle.clone(),
        ));

        Self {
            config,
            db,
            tenders,
            bids,
        }
    }
}

/// Build the `/api` router with bearer checks on protected routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::public_routes())
        .nest(
            "/api",
            api::protected_routes().layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state)
}
