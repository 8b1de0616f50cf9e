//! Organization model
//!
//! Organizations and their responsible users are provisioned outside this
//! service; the API only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legal form of an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizationType {
    /// Individual entrepreneur
    IE,
    /// Limited liability company
    LLC,
    /// Joint-stock company
    JSC,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::IE => "IE",
            OrganizationType::LLC => "LLC",
            OrganizationType::JSC => "JSC",
        }
    }
}

impl std::str::FromStr for OrganizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IE" => Ok(OrganizationType::IE),
            "LLC" => Ok(OrganizationType::LLC),
            "JSC" => Ok(OrganizationType::JSC),
            _ => Err(format!("Invalid organization type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub organization_type: OrganizationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: &str, organization_type: OrganizationType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            organization_type,
            created_at: now,
            updated_at: now,
        }
    }
}
