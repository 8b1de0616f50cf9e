//! Bid lifecycle: creation, listings, status changes, edits, rollback,
//! feedback and the decision workflow that closes a tender.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::authorization::AuthorizationGate;
use super::error::{Missing, ServiceError, ServiceResult, StoreResultExt};
use crate::config::LifecycleConfig;
use crate::db::{
    BidFilter, BidRepository, OrganizationRepository, TenderRepository, UserRepository,
};
use crate::models::{
    Bid, BidAuthor, BidDecision, BidFeedback, BidStatus, CreateBidRequest, EditBidRequest,
    PageQuery, Tender, TenderStatus,
};
use crate::utils::validation;

pub struct BidService {
    bids: Arc<dyn BidRepository>,
    tenders: Arc<dyn TenderRepository>,
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    gate: AuthorizationGate,
    lifecycle: LifecycleConfig,
}

impl BidService {
    pub fn new(
        bids: Arc<dyn BidRepository>,
        tenders: Arc<dyn TenderRepository>,
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        lifecycle: LifecycleConfig,
    ) -> Self {
        let gate = AuthorizationGate::new(organizations.clone());
        Self {
            bids,
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

    async fn load(&self, id: Uuid) -> ServiceResult<Bid> {
        self.bids.get_by_id(id).await.or_missing(Missing::Bid)
    }

    async fn load_tender(&self, id: Uuid) -> ServiceResult<Tender> {
        self.tenders.get_by_id(id).await.or_missing(Missing::Tender)
    }

    async fn save(&self, bid: &Bid) -> ServiceResult<Bid> {
        self.bids.update(bid).await.map_err(|e| {
            tracing::error!(bid_id = %bid.id, error = %e, "Failed to update bid");
            ServiceError::from_store(e, Missing::Bid)
        })
    }

    fn require_creator(bid: &Bid, username: &str) -> ServiceResult<()> {
        if bid.creator_username == username {
            Ok(())
        } else {
            tracing::warn!(bid_id = %bid.id, username = username, "User is not the bid creator");
            Err(ServiceError::Forbidden)
        }
    }

    /// Organization bids are gated by responsibility, user bids by authorship
    async fn require_author_rights(&self, bid: &Bid, username: &str) -> ServiceResult<()> {
        match &bid.author {
            BidAuthor::Organization(org_id) => {
                self.gate.require_responsible(*org_id, username).await
            }
            BidAuthor::User(author) if author == username => Ok(()),
            BidAuthor::User(_) => {
                tracing::warn!(bid_id = %bid.id, username = username, "User is not the bid author");
                Err(ServiceError::Forbidden)
            }
        }
    }

    pub async fn create_bid(&self, req: CreateBidRequest) -> ServiceResult<Bid> {
        let new = validation::validate_create_bid(&req)?;

        let tender = self.load_tender(new.tender_id).await?;
        if tender.status == TenderStatus::Closed {
            return Err(ServiceError::InvalidTransition(
                "tender is closed to new bids".to_string(),
            ));
        }

        let author = match new.organization_id {
            Some(org_id) => {
                self.organizations
                    .get_by_id(org_id)
                    .await
                    .or_missing(Missing::Organization)?;
                BidAuthor::Organization(org_id)
            }
            None => {
                self.require_user(&new.creator_username).await?;
                BidAuthor::User(new.creator_username.clone())
            }
        };

        let bid = Bid::new(new, author, Utc::now());
        let created = self.bids.create(&bid).await.map_err(|e| {
            tracing::error!(bid_id = %bid.id, error = %e, "Failed to create bid");
            ServiceError::from_store(e, Missing::Bid)
        })?;

        tracing::info!(
            bid_id = %created.id,
            tender_id = %created.tender_id,
            author_type = created.author.kind(),
            "Bid created"
        );
        Ok(created)
    }

    pub async fn list_user_bids(&self, page: PageQuery, username: &str) -> ServiceResult<Vec<Bid>> {
        let page = validation::validate_page(page, self.lifecycle.default_page_limit)?;
        self.require_user(username).await?;

        self.bids
            .list(&BidFilter::by_creator(username), page)
            .await
            .or_missing(Missing::Bid)
    }

    pub async fn list_tender_bids(
        &self,
        tender_id: Uuid,
        username: &str,
        page: PageQuery,
    ) -> ServiceResult<Vec<Bid>> {
        let page = validation::validate_page(page, self.lifecycle.default_page_limit)?;
        self.require_user(username).await?;
        self.load_tender(tender_id).await?;

        self.bids
            .list(&BidFilter::by_tender(tender_id), page)
            .await
            .or_missing(Missing::Bid)
    }

    pub async fn bid_status(&self, id: Uuid, username: &str) -> ServiceResult<BidStatus> {
        self.require_user(username).await?;
        Ok(self.load(id).await?.status)
    }

    /// Approved and Rejected are reachable only through [`BidService::submit_decision`]
    pub async fn update_bid_status(
        &self,
        id: Uuid,
        username: &str,
        status: &str,
    ) -> ServiceResult<Bid> {
        let status = validation::validate_bid_status(status)?;
        self.require_user(username).await?;
        let mut bid = self.load(id).await?;

        self.require_author_rights(&bid, username).await?;

        if status.is_final() {
            return Err(ServiceError::InvalidTransition(format!(
                "{} can only be set by a decision",
                status
            )));
        }
        if bid.status.is_final() {
            return Err(ServiceError::InvalidTransition(format!(
                "bid is already {}",
                bid.status
            )));
        }
        if bid.status == status {
            return Err(ServiceError::InvalidTransition(format!(
                "bid is already {}",
                status
            )));
        }

        bid.status = status;
        let updated = self.save(&bid).await?;
        tracing::info!(bid_id = %id, status = %status, version = updated.version, "Bid status changed");
        Ok(updated)
    }

    pub async fn edit_bid(
        &self,
        id: Uuid,
        username: &str,
        req: EditBidRequest,
    ) -> ServiceResult<Bid> {
        let patch = validation::validate_bid_patch(&req)?;
        self.require_user(username).await?;
        let mut bid = self.load(id).await?;
        Self::require_creator(&bid, username)?;

        bid.apply_patch(&patch);
        self.save(&bid).await
    }

    pub async fn rollback_bid(&self, id: Uuid, username: &str, version: i64) -> ServiceResult<Bid> {
        let version = validation::validate_version(version)?;
        self.require_user(username).await?;
        let bid = self.load(id).await?;
        Self::require_creator(&bid, username)?;
        if bid.status.is_final() {
            return Err(ServiceError::InvalidTransition(format!(
                "bid is already {} and cannot be rolled back",
                bid.status
            )));
        }

        let restored = self
            .bids
            .rollback_to_version(id, version)
            .await
            .map_err(|e| {
                tracing::warn!(bid_id = %id, version = version, error = %e, "Bid rollback failed");
                ServiceError::from_store(e, Missing::Bid)
            })?;

        tracing::info!(
            bid_id = %id,
            restored_from = version,
            version = restored.version,
            "Bid rolled back"
        );
        Ok(restored)
    }

    /// Leave a review on a bid; the bid moves to a new version with its fields unchanged
    pub async fn add_feedback(&self, id: Uuid, username: &str, review: &str) -> ServiceResult<Bid> {
        validation::validate_review(review)?;
        self.require_user(username).await?;
        let bid = self.load(id).await?;
        self.gate
            .require_responsible_for_tender(bid.tender_id, username)
            .await?;

        let feedback = BidFeedback::new(id, username, review, Utc::now());
        self.bids.add_feedback(&feedback).await.map_err(|e| {
            tracing::error!(bid_id = %id, username = username, error = %e, "Failed to add bid feedback");
            ServiceError::from_store(e, Missing::Bid)
        })
    }

    /// Feedback on a bid, newest first
    pub async fn list_feedback(
        &self,
        id: Uuid,
        username: &str,
        page: PageQuery,
    ) -> ServiceResult<Vec<BidFeedback>> {
        let page = validation::validate_page(page, self.lifecycle.default_page_limit)?;
        self.require_user(username).await?;
        self.load(id).await?;

        self.bids.list_feedback(id, page).await.or_missing(Missing::Bid)
    }

    /// Approve or reject a bid on behalf of the tender's organization
    ///
    /// Approval closes the tender first. The tender and bid writes are separate
    /// units: if the bid write fails after the tender was closed, the tender
    /// stays closed and the error is returned.
    pub async fn submit_decision(
        &self,
        id: Uuid,
        username: &str,
        decision: &str,
    ) -> ServiceResult<Bid> {
        self.require_user(username).await?;
        let mut bid = self.load(id).await?;
        let mut tender = self.load_tender(bid.tender_id).await?;

        self.gate
            .require_responsible_for_tender(tender.id, username)
            .await?;

        if !bid.status.awaits_decision() {
            return Err(ServiceError::DecisionSubmit(format!(
                "bid is already {}",
                bid.status
            )));
        }

        match decision.parse::<BidDecision>() {
            Ok(BidDecision::Approved) => {
                bid.status = BidStatus::Approved;
                tender.status = TenderStatus::Closed;
                self.tenders.update(&tender).await.map_err(|e| {
                    tracing::error!(tender_id = %tender.id, error = %e, "Failed to close tender");
                    ServiceError::from_store(e, Missing::Tender)
                })?;
            }
            Ok(BidDecision::Rejected) => bid.status = BidStatus::Rejected,
            Err(e) => return Err(ServiceError::DecisionSubmit(e)),
        }

        let decided = self.save(&bid).await?;
        tracing::info!(
            bid_id = %id,
            tender_id = %tender.id,
            decision = decision,
            "Bid decision submitted"
        );
        Ok(decided)
    }

    pub async fn bid_history(&self, id: Uuid) -> ServiceResult<Vec<Bid>> {
        self.load(id).await?;
        self.bids.history(id).await.or_missing(Missing::Bid)
    }
}
