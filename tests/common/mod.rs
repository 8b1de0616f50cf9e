//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - Test fixtures and factories
//! - Test database setup
//! - API test client

#![allow(dead_code)]

pub mod factories;
pub mod test_app;

pub use factories::*;
pub use fixtures::*;
pub use test_app::*;
