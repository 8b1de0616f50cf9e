//! Tender data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FieldPatch, Versioned};

/// Tender lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TenderStatus {
    /// Draft, visible to the owning organization only
    #[default]
    Created,
    /// Open for bidding
    Published,
    /// No further bids accepted
    Closed,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Created => "Created",
            TenderStatus::Published => "Published",
            TenderStatus::Closed => "Closed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            TenderStatus::Created => 0,
            TenderStatus::Published => 1,
            TenderStatus::Closed => 2,
        }
    }

    /// Whether `next` lies strictly after this status in Created -> Published -> Closed.
    pub fn precedes(&self, next: TenderStatus) -> bool {
        self.rank() < next.rank()
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TenderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(TenderStatus::Created),
            "published" => Ok(TenderStatus::Published),
            "closed" => Ok(TenderStatus::Closed),
            _ => Err(format!("Invalid tender status: {}", s)),
        }
    }
}

/// Category of work a tender requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenderServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl TenderServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderServiceType::Construction => "Construction",
            TenderServiceType::Delivery => "Delivery",
            TenderServiceType::Manufacture => "Manufacture",
        }
    }
}

impl std::fmt::Display for TenderServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TenderServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "construction" => Ok(TenderServiceType::Construction),
            "delivery" => Ok(TenderServiceType::Delivery),
            "manufacture" => Ok(TenderServiceType::Manufacture),
            _ => Err(format!("Invalid service type: {}", s)),
        }
    }
}

/// A request for work published by an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: TenderServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tender {
    /// Build a fresh tender at version 1 in `Created` status
    pub fn new(new: NewTender, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            service_type: new.service_type,
            status: TenderStatus::Created,
            organization_id: new.organization_id,
            creator_username: new.creator_username,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a field patch in place. Unchanged fields are left alone.
    pub fn apply_patch(&mut self, patch: &TenderPatch) {
        patch.name.apply_to(&mut self.name);
        patch.description.apply_to(&mut self.description);
        patch.service_type.apply_to(&mut self.service_type);
    }
}

impl Versioned for Tender {
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

/// Body of `POST /tenders/new`
///
/// Fields are kept as raw strings so that validation can report every
/// problem at once instead of failing on the first bad enum value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTenderRequest {
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub organization_id: String,
    pub creator_username: String,
}

/// Validated tender creation command
#[derive(Debug, Clone, PartialEq)]
pub struct NewTender {
    pub name: String,
    pub description: String,
    pub service_type: TenderServiceType,
    pub organization_id: Uuid,
    pub creator_username: String,
}

/// Body of `PATCH /tenders/{id}/edit`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTenderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<String>,
}

/// Field changes for a tender edit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenderPatch {
    pub name: FieldPatch<String>,
    pub description: FieldPatch<String>,
    pub service_type: FieldPatch<TenderServiceType>,
}
