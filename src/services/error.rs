//! Error taxonomy of the lifecycle services

use thiserror::Error;

use crate::db::StoreError;

/// Errors surfaced by the tender and bid services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Tender not found")]
    TenderNotFound,

    #[error("Bid not found")]
    BidNotFound,

    #[error("Version {0} not found")]
    VersionNotFound(i32),

    #[error("Insufficient rights to perform this action")]
    Forbidden,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Cannot submit decision: {0}")]
    DecisionSubmit(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Storage failure: {0:#}")]
    Storage(anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Which entity a bare `StoreError::NotFound` refers to
#[derive(Debug, Clone, Copy)]
pub enum Missing {
    User,
    Organization,
    Tender,
    Bid,
}

impl ServiceError {
    /// Translate a repository error, naming the entity a `NotFound` refers to
    pub fn from_store(err: StoreError, missing: Missing) -> Self {
        match err {
            StoreError::NotFound => match missing {
                Missing::User => ServiceError::UserNotFound,
                Missing::Organization => ServiceError::OrganizationNotFound,
                Missing::Tender => ServiceError::TenderNotFound,
                Missing::Bid => ServiceError::BidNotFound,
            },
            StoreError::VersionNotFound(v) => ServiceError::VersionNotFound(v),
            StoreError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

/// Attach the entity kind to repository errors with `.or_missing(Missing::Bid)`
pub(crate) trait StoreResultExt<T> {
    fn or_missing(self, missing: Missing) -> ServiceResult<T>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_missing(self, missing: Missing) -> ServiceResult<T> {
        self.map_err(|e| ServiceError::from_store(e, missing))
    }
}
