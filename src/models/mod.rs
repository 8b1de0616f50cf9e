//! Data models

mod bid;
mod organization;
mod pagination;
mod patch;
mod tender;
mod user;

pub use bid::*;
pub use organization::*;
pub use pagination::*;
pub use patch::*;
pub use tender::*;
pub use user::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An entity whose every persisted mutation bumps a version counter
/// and leaves a snapshot of the previous state behind.
pub trait Versioned: Clone {
    fn id(&self) -> Uuid;

    fn version(&self) -> i32;

    /// Turn `self` into the row that replaces `stored`: same identity and
    /// creation time, next version, updated at `at`.
    fn stamp_after(&mut self, stored: &Self, at: DateTime<Utc>);
}
