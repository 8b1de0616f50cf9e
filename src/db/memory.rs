//! In-memory repositories
//!
//! Implements every storage trait over a single lock so that each versioned
//! write (snapshot + overwrite) is observed atomically, matching the SQLite
//! transactions. Used by unit tests and the BDD suite.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::repository::{
    BidFilter, BidRepository, OrganizationRepository, StoreError, StoreResult, TenderFilter,
    TenderRepository, UserRepository,
};
use crate::models::{Bid, BidFeedback, Organization, Page, Tender, User, Versioned};

/// Current rows plus their per-version snapshots
#[derive(Debug)]
struct VersionedTable<T> {
    current: HashMap<Uuid, T>,
    history: HashMap<Uuid, BTreeMap<i32, T>>,
}

impl<T> Default for VersionedTable<T> {
    fn default() -> Self {
        Self {
            current: HashMap::new(),
            history: HashMap::new(),
        }
    }
}

impl<T: Versioned> VersionedTable<T> {
    fn insert(&mut self, row: &T) -> StoreResult<T> {
        if self.current.contains_key(&row.id()) {
            return Err(StoreError::Storage(anyhow!(
                "duplicate primary key {}",
                row.id()
            )));
        }
        self.current.insert(row.id(), row.clone());
        Ok(row.clone())
    }

    fn get(&self, id: Uuid) -> StoreResult<T> {
        self.current.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    /// Snapshot the stored row and replace it with `next` at the following version
    fn write_next(&mut self, mut next: T) -> StoreResult<T> {
        let stored = self.get(next.id())?;
        self.history
            .entry(stored.id())
            .or_default()
            .insert(stored.version(), stored.clone());

        next.stamp_after(&stored, Utc::now());
        self.current.insert(next.id(), next.clone());
        Ok(next)
    }

    fn rollback(&mut self, id: Uuid, version: i32) -> StoreResult<T> {
        self.get(id)?;
        let snapshot = self
            .history
            .get(&id)
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or(StoreError::VersionNotFound(version))?;
        self.write_next(snapshot)
    }

    fn history(&self, id: Uuid) -> Vec<T> {
        self.history
            .get(&id)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default()
    }

    fn select<K: Ord>(
        &self,
        pred: impl Fn(&T) -> bool,
        sort_key: impl Fn(&T) -> K,
        page: Page,
    ) -> Vec<T> {
        let mut rows: Vec<&T> = self.current.values().filter(|r| pred(r)).collect();
        rows.sort_by_key(|r| sort_key(r));
        let (start, end) = page.bounds(rows.len());
        rows[start..end].iter().map(|r| (*r).clone()).collect()
    }
}

#[derive(Debug, Default)]
struct Tables {
    tenders: VersionedTable<Tender>,
    bids: VersionedTable<Bid>,
    feedback: Vec<BidFeedback>,
    users: HashMap<String, User>,
    organizations: HashMap<Uuid, Organization>,
    /// (organization id, user id)
    responsible: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn is_responsible(&self, organization_id: Uuid, username: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|user| self.responsible.contains(&(organization_id, user.id)))
    }
}

/// Whole-domain store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage(anyhow!("memory store lock poisoned")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage(anyhow!("memory store lock poisoned")))
    }

    pub fn add_user(&self, user: User) -> StoreResult<()> {
        self.write()?.users.insert(user.username.clone(), user);
        Ok(())
    }

    pub fn add_organization(&self, org: Organization) -> StoreResult<()> {
        self.write()?.organizations.insert(org.id, org);
        Ok(())
    }

    pub fn add_responsible(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        self.write()?.responsible.insert((organization_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl TenderRepository for MemoryStore {
    async fn create(&self, tender: &Tender) -> StoreResult<Tender> {
        self.write()?.tenders.insert(tender)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Tender> {
        self.read()?.tenders.get(id)
    }

    async fn list(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>> {
        Ok(self.read()?.tenders.select(
            |t| filter.matches(t),
            |t| (t.name.clone(), t.id),
            page,
        ))
    }

    async fn update(&self, tender: &Tender) -> StoreResult<Tender> {
        self.write()?.tenders.write_next(tender.clone())
    }

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Tender> {
        self.write()?.tenders.rollback(id, version)
    }

    async fn history(&self, id: Uuid) -> StoreResult<Vec<Tender>> {
        Ok(self.read()?.tenders.history(id))
    }
}

#[async_trait]
impl BidRepository for MemoryStore {
    async fn create(&self, bid: &Bid) -> StoreResult<Bid> {
        self.write()?.bids.insert(bid)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Bid> {
        self.read()?.bids.get(id)
    }

    async fn list(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>> {
        Ok(self.read()?.bids.select(
            |b| filter.matches(b),
            |b| (b.name.clone(), b.id),
            page,
        ))
    }

    async fn update(&self, bid: &Bid) -> StoreResult<Bid> {
        self.write()?.bids.write_next(bid.clone())
    }

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Bid> {
        self.write()?.bids.rollback(id, version)
    }

    async fn history(&self, id: Uuid) -> StoreResult<Vec<Bid>> {
        Ok(self.read()?.bids.history(id))
    }

    async fn add_feedback(&self, feedback: &BidFeedback) -> StoreResult<Bid> {
        let mut tables = self.write()?;
        let stored = tables.bids.get(feedback.bid_id)?;
        let bid = tables.bids.write_next(stored)?;
        tables.feedback.push(feedback.clone());
        Ok(bid)
    }

    async fn list_feedback(&self, bid_id: Uuid, page: Page) -> StoreResult<Vec<BidFeedback>> {
        let tables = self.read()?;
        let mut rows: Vec<&BidFeedback> =
            tables.feedback.iter().filter(|f| f.bid_id == bid_id).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let (start, end) = page.bounds(rows.len());
        Ok(rows[start..end].iter().map(|f| (*f).clone()).collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        self.read()?
            .users
            .get(username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Organization> {
        self.read()?
            .organizations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn is_responsible(&self, organization_id: Uuid, username: &str) -> StoreResult<bool> {
        Ok(self.read()?.is_responsible(organization_id, username))
    }

    async fn is_responsible_for_tender(
        &self,
        tender_id: Uuid,
        username: &str,
    ) -> StoreResult<bool> {
        let tables = self.read()?;
        Ok(tables
            .tenders
            .current
            .get(&tender_id)
            .is_some_and(|t| tables.is_responsible(t.organization_id, username)))
    }
}
