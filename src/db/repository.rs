//! Storage contracts shared by the SQLite and in-memory backends

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Bid, BidFeedback, Organization, Page, Tender, TenderServiceType, User,
};

/// Errors raised by a repository
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Version {0} not found")]
    VersionNotFound(i32),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Predicate for tender listings
#[derive(Debug, Clone, Default)]
pub struct TenderFilter {
    /// Match any of these categories; empty matches every tender
    pub service_types: Vec<TenderServiceType>,
    pub creator_username: Option<String>,
}

impl TenderFilter {
    pub fn by_service_types(service_types: Vec<TenderServiceType>) -> Self {
        Self {
            service_types,
            creator_username: None,
        }
    }

    pub fn by_creator(username: &str) -> Self {
        Self {
            service_types: Vec::new(),
            creator_username: Some(username.to_string()),
        }
    }

    pub fn matches(&self, tender: &Tender) -> bool {
        (self.service_types.is_empty() || self.service_types.contains(&tender.service_type))
            && self
                .creator_username
                .as_deref()
                .is_none_or(|u| tender.creator_username == u)
    }
}

/// Predicate for bid listings
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
    pub creator_username: Option<String>,
    pub tender_id: Option<Uuid>,
}

impl BidFilter {
    pub fn by_creator(username: &str) -> Self {
        Self {
            creator_username: Some(username.to_string()),
            tender_id: None,
        }
    }

    pub fn by_tender(tender_id: Uuid) -> Self {
        Self {
            creator_username: None,
            tender_id: Some(tender_id),
        }
    }

    pub fn matches(&self, bid: &Bid) -> bool {
        self.creator_username
            .as_deref()
            .is_none_or(|u| bid.creator_username == u)
            && self.tender_id.is_none_or(|t| bid.tender_id == t)
    }
}

/// Versioned tender storage
///
/// `update` and `rollback_to_version` snapshot the stored row under its
/// current version and write the new state at `version + 1`, atomically.
#[async_trait]
pub trait TenderRepository: Send + Sync {
    async fn create(&self, tender: &Tender) -> StoreResult<Tender>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Tender>;

    async fn list(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>>;

    async fn update(&self, tender: &Tender) -> StoreResult<Tender>;

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Tender>;

    /// Snapshots for `id`, ordered by version
    async fn history(&self, id: Uuid) -> StoreResult<Vec<Tender>>;
}

/// Versioned bid storage plus its append-only feedback log
#[async_trait]
pub trait BidRepository: Send + Sync {
    async fn create(&self, bid: &Bid) -> StoreResult<Bid>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Bid>;

    async fn list(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>>;

    async fn update(&self, bid: &Bid) -> StoreResult<Bid>;

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Bid>;

    async fn history(&self, id: Uuid) -> StoreResult<Vec<Bid>>;

    /// Record feedback and bump the bid version in one write, snapshotting the prior state
    async fn add_feedback(&self, feedback: &BidFeedback) -> StoreResult<Bid>;

    /// Feedback on a bid, newest first
    async fn list_feedback(&self, bid_id: Uuid, page: Page) -> StoreResult<Vec<BidFeedback>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_username(&self, username: &str) -> StoreResult<User>;
}

/// Organization lookup and the responsibility relation
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Organization>;

    async fn is_responsible(&self, organization_id: Uuid, username: &str) -> StoreResult<bool>;

    /// Responsibility for the organization that owns `tender_id`
    async fn is_responsible_for_tender(&self, tender_id: Uuid, username: &str)
        -> StoreResult<bool>;
}
