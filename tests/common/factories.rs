//! Test factories for generating test data
//!
//! Factories create randomized test data, useful when a test needs many
//! distinct records rather than the fixed marketplace fixture.

use chrono::Utc;
use fake::faker::company::en::{Bs, CompanyName};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use uuid::Uuid;

use tender_api::models::{Bid, BidAuthor, NewBid, NewTender, Tender, TenderServiceType};

/// Random tender name short enough to pass validation
pub fn tender_name() -> String {
    let name: String = Bs().fake();
    name.chars().take(100).collect()
}

pub fn description() -> String {
    Sentence(3..10).fake()
}

/// Factory for tenders written straight to a repository
pub struct TenderFactory {
    pub organization_id: Uuid,
    pub creator_username: String,
}

impl TenderFactory {
    pub fn new(organization_id: Uuid, creator_username: &str) -> Self {
        Self {
            organization_id,
            creator_username: creator_username.to_string(),
        }
    }

    pub fn build(&self, service_type: TenderServiceType) -> Tender {
        Tender::new(
            NewTender {
                name: tender_name(),
                description: description(),
                service_type,
                organization_id: self.organization_id,
                creator_username: self.creator_username.clone(),
            },
            Utc::now(),
        )
    }

    pub fn named(&self, name: &str, service_type: TenderServiceType) -> Tender {
        let mut tender = self.build(service_type);
        tender.name = name.to_string();
        tender
    }
}

/// Random organization-authored bid on `tender_id`
pub fn organization_bid(tender_id: Uuid, organization_id: Uuid, creator_username: &str) -> Bid {
    let name: String = CompanyName().fake();
    Bid::new(
        NewBid {
            name: name.chars().take(100).collect(),
            description: description(),
            tender_id,
            organization_id: Some(organization_id),
            creator_username: creator_username.to_string(),
        },
        BidAuthor::Organization(organization_id),
        Utc::now(),
    )
}

/// Random user-authored bid on `tender_id`
pub fn user_bid(tender_id: Uuid, username: &str) -> Bid {
    Bid::new(
        NewBid {
            name: format!("{} offer", username),
            description: description(),
            tender_id,
            organization_id: None,
            creator_username: username.to_string(),
        },
        BidAuthor::User(username.to_string()),
        Utc::now(),
    )
}
