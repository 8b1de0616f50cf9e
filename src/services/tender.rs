//! Tender lifecycle: creation, listings, status changes, edits and rollback

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::authorization::AuthorizationGate;
use super::error::{Missing, ServiceError, ServiceResult, StoreResultExt};
use crate::config::LifecycleConfig;
use crate::db::{OrganizationRepository, TenderFilter, TenderRepository, UserRepository};
use crate::models::{
    CreateTenderRequest, EditTenderRequest, PageQuery, Tender, TenderStatus,
};
use crate::utils::validation;

pub struct TenderService {
    tenders: Arc<dyn TenderRepository>,
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    gate: AuthorizationGate,
    lifecycle: LifecycleConfig,
}

impl TenderService {
    pub fn new(
        tenders: Arc<dyn TenderRepository>,
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        lifecycle: LifecycleConfig,
    ) -> Self {
        let gate = AuthorizationGate::new(organizations.clone());
        Self {
            tenders,
            users,
            organizations,
            gate,
            lifecycle,
        }
    }

    async fn require_user(&self, username: &str) -> ServiceResult<()> {
        validation::validate_username(username)?;
        self.users
            .get_by_username(username)
            .await
            .or_missing(Missing::User)
            .map(|_| ())
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Tender> {
        self.tenders.get_by_id(id).await.or_missing(Missing::Tender)
    }

    /// Persist `tender` as the next version, logging storage failures
    async fn save(&self, tender: &Tender) -> ServiceResult<Tender> {
        self.tenders.update(tender).await.map_err(|e| {
            tracing::error!(tender_id = %tender.id, error = %e, "Failed to update tender");
            ServiceError::from_store(e, Missing::Tender)
        })
    }

    pub async fn create_tender(&self, req: CreateTenderRequest) -> ServiceResult<Tender> {
        let new = validation::validate_create_tender(&req)?;

        self.require_user(&new.creator_username).await?;
        self.organizations
            .get_by_id(new.organization_id)
            .await
            .or_missing(Missing::Organization)?;
        self.gate
            .require_responsible(new.organization_id, &new.creator_username)
            .await?;

        let tender = Tender::new(new, Utc::now());
        let created = self.tenders.create(&tender).await.map_err(|e| {
            tracing::error!(tender_id = %tender.id, error = %e, "Failed to create tender");
            ServiceError::from_store(e, Missing::Tender)
        })?;

        tracing::info!(
            tender_id = %created.id,
            organization_id = %created.organization_id,
            username = %created.creator_username,
            "Tender created"
        );
        Ok(created)
    }

    /// Tenders in any of `service_types`; an empty list matches every tender
    pub async fn list_tenders(
        &self,
        page: PageQuery,
        service_types: &[String],
    ) -> ServiceResult<Vec<Tender>> {
        let page = validation::validate_page(page, self.lifecycle.default_page_limit)?;
        let service_types = validation::validate_service_types(service_types)?;

        self.tenders
            .list(&TenderFilter::by_service_types(service_types), page)
            .await
            .or_missing(Missing::Tender)
    }

    pub async fn list_user_tenders(
        &self,
        page: PageQuery,
        username: &str,
    ) -> ServiceResult<Vec<Tender>> {
        let page = validation::validate_page(page, self.lifecycle.default_page_limit)?;
        self.require_user(username).await?;

        self.tenders
            .list(&TenderFilter::by_creator(username), page)
            .await
            .or_missing(Missing::Tender)
    }

    pub async fn tender_status(&self, id: Uuid) -> ServiceResult<TenderStatus> {
        Ok(self.load(id).await?.status)
    }

    pub async fn update_tender_status(
        &self,
        id: Uuid,
        username: &str,
        status: &str,
    ) -> ServiceResult<Tender> {
        let status = validation::validate_tender_status(status)?;
        self.require_user(username).await?;
        let mut tender = self.load(id).await?;

        self.gate.require_responsible_for_tender(id, username).await?;

        if tender.status == status {
            return Err(ServiceError::InvalidTransition(format!(
                "tender is already {}",
                status
            )));
        }
        if self.lifecycle.forward_only_tender_status && !tender.status.precedes(status) {
            return Err(ServiceError::InvalidTransition(format!(
                "cannot move tender from {} back to {}",
                tender.status, status
            )));
        }

        tender.status = status;
        let updated = self.save(&tender).await?;
        tracing::info!(tender_id = %id, status = %status, version = updated.version, "Tender status changed");
        Ok(updated)
    }

    /// Only the tender's creator may edit its fields
    pub async fn edit_tender(
        &self,
        id: Uuid,
        username: &str,
        req: EditTenderRequest,
    ) -> ServiceResult<Tender> {
        let patch = validation::validate_tender_patch(&req)?;
        self.require_user(username).await?;
        let mut tender = self.load(id).await?;

        if tender.creator_username != username {
            tracing::warn!(tender_id = %id, username = username, "Edit by non-creator rejected");
            return Err(ServiceError::Forbidden);
        }

        tender.apply_patch(&patch);
        self.save(&tender).await
    }

    /// Restore the fields of `version` as a new current version
    pub async fn rollback_tender(&self, id: Uuid, version: i64) -> ServiceResult<Tender> {
        let version = validation::validate_version(version)?;

        let restored = self
            .tenders
            .rollback_to_version(id, version)
            .await
            .map_err(|e| {
                tracing::warn!(tender_id = %id, version = version, error = %e, "Tender rollback failed");
                ServiceError::from_store(e, Missing::Tender)
            })?;

        tracing::info!(
            tender_id = %id,
            restored_from = version,
            version = restored.version,
            "Tender rolled back"
        );
        Ok(restored)
    }

    pub async fn tender_history(&self, id: Uuid) -> ServiceResult<Vec<Tender>> {
        self.load(id).await?;
        self.tenders.history(id).await.or_missing(Missing::Tender)
    }
}
