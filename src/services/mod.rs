//! Business logic services

pub mod authorization;
pub mod bid;
pub mod error;
pub mod tender;

pub use authorization::AuthorizationGate;
pub use bid::BidService;
pub use error::{ServiceError, ServiceResult};
pub use tender::TenderService;
