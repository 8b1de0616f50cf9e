//! Organization-responsibility checks

use std::sync::Arc;

use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::db::OrganizationRepository;

/// Decides whether a user may act on behalf of an organization
#[derive(Clone)]
pub struct AuthorizationGate {
    organizations: Arc<dyn OrganizationRepository>,
}

impl AuthorizationGate {
    pub fn new(organizations: Arc<dyn OrganizationRepository>) -> Self {
        Self { organizations }
    }

    /// `Ok(false)` when no responsibility exists; `Err` only when the lookup itself failed
    pub async fn is_responsible(&self, organization_id: Uuid, username: &str) -> ServiceResult<bool> {
        self.organizations
            .is_responsible(organization_id, username)
            .await
            .map_err(|e| {
                tracing::error!(
                    organization_id = %organization_id,
                    username = username,
                    error = %e,
                    "Responsibility lookup failed"
                );
                ServiceError::Storage(e.into())
            })
    }

    pub async fn is_responsible_for_tender(
        &self,
        tender_id: Uuid,
        username: &str,
    ) -> ServiceResult<bool> {
        self.organizations
            .is_responsible_for_tender(tender_id, username)
            .await
            .map_err(|e| {
                tracing::error!(
                    tender_id = %tender_id,
                    username = username,
                    error = %e,
                    "Tender responsibility lookup failed"
                );
                ServiceError::Storage(e.into())
            })
    }

    pub async fn require_responsible(&self, organization_id: Uuid, username: &str) -> ServiceResult<()> {
        if self.is_responsible(organization_id, username).await? {
            Ok(())
        } else {
            tracing::warn!(
                organization_id = %organization_id,
                username = username,
                "User is not responsible for organization"
            );
            Err(ServiceError::Forbidden)
        }
    }

    pub async fn require_responsible_for_tender(
        &self,
        tender_id: Uuid,
        username: &str,
    ) -> ServiceResult<()> {
        if self.is_responsible_for_tender(tender_id, username).await? {
            Ok(())
        } else {
            tracing::warn!(
                tender_id = %tender_id,
                username = username,
                "User is not responsible for tender"
            );
            Err(ServiceError::Forbidden)
        }
    }
}
