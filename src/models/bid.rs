//! Bid data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FieldPatch, Versioned};

/// Bid lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BidStatus {
    #[default]
    Created,
    Published,
    Canceled,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Created => "Created",
            BidStatus::Published => "Published",
            BidStatus::Canceled => "Canceled",
            BidStatus::Approved => "Approved",
            BidStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected are only reachable through a decision and never left again
    pub fn is_final(&self) -> bool {
        matches!(self, BidStatus::Approved | BidStatus::Rejected)
    }

    /// Whether a tender owner may still decide on a bid in this status
    pub fn awaits_decision(&self) -> bool {
        matches!(self, BidStatus::Created | BidStatus::Published)
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(BidStatus::Created),
            "published" => Ok(BidStatus::Published),
            "canceled" | "cancelled" => Ok(BidStatus::Canceled),
            "approved" => Ok(BidStatus::Approved),
            "rejected" => Ok(BidStatus::Rejected),
            _ => Err(format!("Invalid bid status: {}", s)),
        }
    }
}

/// Who a bid is submitted on behalf of
///
/// Serialized as the `authorType` / `authorId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authorType", content = "authorId")]
pub enum BidAuthor {
    Organization(Uuid),
    User(String),
}

impl BidAuthor {
    pub fn kind(&self) -> &'static str {
        match self {
            BidAuthor::Organization(_) => "Organization",
            BidAuthor::User(_) => "User",
        }
    }

    /// Identifier as stored in the `author_id` column
    pub fn id_string(&self) -> String {
        match self {
            BidAuthor::Organization(id) => id.to_string(),
            BidAuthor::User(username) => username.clone(),
        }
    }

    /// Rebuild an author from its stored `(author_type, author_id)` pair
    pub fn from_parts(kind: &str, id: &str) -> Result<Self, String> {
        match kind {
            "Organization" => Uuid::parse_str(id)
                .map(BidAuthor::Organization)
                .map_err(|_| format!("Invalid organization author id: {}", id)),
            "User" => Ok(BidAuthor::User(id.to_string())),
            other => Err(format!("Invalid bid author type: {}", other)),
        }
    }
}

/// A proposal submitted against a tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    #[serde(flatten)]
    pub author: BidAuthor,
    pub creator_username: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    /// Build a fresh bid at version 1 in `Created` status
    pub fn new(new: NewBid, author: BidAuthor, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            status: BidStatus::Created,
            tender_id: new.tender_id,
            author,
            creator_username: new.creator_username,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: &BidPatch) {
        patch.name.apply_to(&mut self.name);
        patch.description.apply_to(&mut self.description);
    }
}

impl Versioned for Bid {
    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn stamp_after(&mut self, stored: &Self, at: DateTime<Utc>) {
        self.id = stored.id;
        self.created_at = stored.created_at;
        self.version = stored.version + 1;
        self.updated_at = at;
    }
}

/// Body of `POST /bids/new`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBidRequest {
    pub name: String,
    pub description: String,
    pub tender_id: String,
    /// When present the bid is authored by this organization, otherwise by the creator
    pub organization_id: Option<String>,
    pub creator_username: String,
}

/// Validated bid creation command
#[derive(Debug, Clone, PartialEq)]
pub struct NewBid {
    pub name: String,
    pub description: String,
    pub tender_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub creator_username: String,
}

/// Body of `PATCH /bids/{id}/edit`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBidRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidPatch {
    pub name: FieldPatch<String>,
    pub description: FieldPatch<String>,
}

/// Outcome a tender owner can give a bid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    Approved,
    Rejected,
}

impl std::str::FromStr for BidDecision {
    type Err = String;

    // Decision labels are matched exactly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(BidDecision::Approved),
            "Rejected" => Ok(BidDecision::Rejected),
            _ => Err(format!("Invalid decision: {}", s)),
        }
    }
}

/// Review left on a bid by the tender side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidFeedback {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub username: String,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

impl BidFeedback {
    pub fn new(bid_id: Uuid, username: &str, review: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bid_id,
            username: username.to_string(),
            review: review.to_string(),
            created_at: now,
        }
    }
}
