//! Bid repository backed by SQLite

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{begin_write, parse_db_timestamp};
use super::repository::{BidFilter, BidRepository, StoreError, StoreResult};
use crate::models::{Bid, BidAuthor, BidFeedback, Page, Versioned};

const BID_COLUMNS: &str = "id, name, description, status, tender_id, author_type, author_id, creator_username, version, created_at, updated_at";
const HISTORY_COLUMNS: &str = "bid_id AS id, name, description, status, tender_id, author_type, author_id, creator_username, version, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: String,
    name: String,
    description: String,
    status: String,
    tender_id: String,
    author_type: String,
    author_id: String,
    creator_username: String,
    version: i32,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    bid_id: String,
    username: String,
    review: String,
    created_at: String,
}

#[derive(Clone)]
pub struct SqliteBidRepository {
    pool: SqlitePool,
}

impl SqliteBidRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BidRepository for SqliteBidRepository {
    async fn create(&self, bid: &Bid) -> StoreResult<Bid> {
        sqlx::query(
            r#"
            INSERT INTO bid (id, name, description, status, tender_id, author_type, author_id, creator_username, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bid.id.to_string())
        .bind(&bid.name)
        .bind(&bid.description)
        .bind(bid.status.as_str())
        .bind(bid.tender_id.to_string())
        .bind(bid.author.kind())
        .bind(bid.author.id_string())
        .bind(&bid.creator_username)
        .bind(bid.version)
        .bind(bid.created_at.to_rfc3339())
        .bind(bid.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create bid")?;

        self.get_by_id(bid.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Bid> {
        let sql = format!("SELECT {BID_COLUMNS} FROM bid WHERE id = ?");
        let row = sqlx::query_as::<_, BidRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get bid")?;

        match row {
            Some(row) => Ok(row_to_bid(row)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>> {
        let mut sql = format!("SELECT {BID_COLUMNS} FROM bid WHERE 1 = 1");

        if filter.creator_username.is_some() {
            sql.push_str(" AND creator_username = ?");
        }
        if filter.tender_id.is_some() {
            sql.push_str(" AND tender_id = ?");
        }
        sql.push_str(" ORDER BY name, id LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, BidRow>(&sql);
        if let Some(ref username) = filter.creator_username {
            q = q.bind(username);
        }
        if let Some(tender_id) = filter.tender_id {
            q = q.bind(tender_id.to_string());
        }
        q = q.bind(page.limit as i64).bind(page.offset as i64);

        let rows = q
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bids")?;

        rows.into_iter()
            .map(|row| row_to_bid(row).map_err(StoreError::from))
            .collect()
    }

    async fn update(&self, bid: &Bid) -> StoreResult<Bid> {
        let mut tx = begin_write(&self.pool)
            .await
            .context("Failed to begin bid update")?;

        let stored = fetch_current(&mut tx, bid.id).await?;
        let written = write_next_version(&mut tx, &stored, bid.clone()).await?;

        tx.commit().await.context("Failed to commit bid update")?;
        Ok(written)
    }

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Bid> {
        let mut tx = begin_write(&self.pool)
            .await
            .context("Failed to begin bid rollback")?;

        let stored = fetch_current(&mut tx, id).await?;

        let sql =
            format!("SELECT {HISTORY_COLUMNS} FROM bid_history WHERE bid_id = ? AND version = ?");
        let snapshot = sqlx::query_as::<_, BidRow>(&sql)
            .bind(id.to_string())
            .bind(version)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read bid snapshot")?
            .ok_or(StoreError::VersionNotFound(version))?;

        let restored = row_to_bid(snapshot)?;
        let written = write_next_version(&mut tx, &stored, restored).await?;

        tx.commit().await.context("Failed to commit bid rollback")?;
        Ok(written)
    }

    async fn history(&self, id: Uuid) -> StoreResult<Vec<Bid>> {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM bid_history WHERE bid_id = ? ORDER BY version");
        let rows = sqlx::query_as::<_, BidRow>(&sql)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bid history")?;

        rows.into_iter()
            .map(|row| row_to_bid(row).map_err(StoreError::from))
            .collect()
    }

    async fn add_feedback(&self, feedback: &BidFeedback) -> StoreResult<Bid> {
        let mut tx = begin_write(&self.pool)
            .await
            .context("Failed to begin bid feedback")?;

        let stored = fetch_current(&mut tx, feedback.bid_id).await?;

        sqlx::query(
            r#"
            INSERT INTO bid_feedback (id, bid_id, username, review, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(feedback.id.to_string())
        .bind(feedback.bid_id.to_string())
        .bind(&feedback.username)
        .bind(&feedback.review)
        .bind(feedback.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to insert bid feedback")?;

        let written = write_next_version(&mut tx, &stored, stored.clone()).await?;

        tx.commit().await.context("Failed to commit bid feedback")?;
        Ok(written)
    }

    async fn list_feedback(&self, bid_id: Uuid, page: Page) -> StoreResult<Vec<BidFeedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, bid_id, username, review, created_at
            FROM bid_feedback
            WHERE bid_id = ?
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(bid_id.to_string())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bid feedback")?;

        rows.into_iter()
            .map(|row| row_to_feedback(row).map_err(StoreError::from))
            .collect()
    }
}

async fn fetch_current(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> StoreResult<Bid> {
    let sql = format!("SELECT {BID_COLUMNS} FROM bid WHERE id = ?");
    let row = sqlx::query_as::<_, BidRow>(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to read current bid")?
        .ok_or(StoreError::NotFound)?;

    Ok(row_to_bid(row)?)
}

async fn write_next_version(
    tx: &mut Transaction<'_, Sqlite>,
    stored: &Bid,
    mut next: Bid,
) -> StoreResult<Bid> {
    sqlx::query(
        r#"
        INSERT INTO bid_history (bid_id, version, name, description, status, tender_id, author_type, author_id, creator_username, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stored.id.to_string())
    .bind(stored.version)
    .bind(&stored.name)
    .bind(&stored.description)
    .bind(stored.status.as_str())
    .bind(stored.tender_id.to_string())
    .bind(stored.author.kind())
    .bind(stored.author.id_string())
    .bind(&stored.creator_username)
    .bind(stored.created_at.to_rfc3339())
    .bind(stored.updated_at.to_rfc3339())
    .execute(&mut **tx)
    .await
    .context("Failed to write bid snapshot")?;

    next.stamp_after(stored, Utc::now());

    sqlx::query(
        r#"
        UPDATE bid
        SET name = ?, description = ?, status = ?, tender_id = ?, author_type = ?, author_id = ?,
            creator_username = ?, version = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&next.name)
    .bind(&next.description)
    .bind(next.status.as_str())
    .bind(next.tender_id.to_string())
    .bind(next.author.kind())
    .bind(next.author.id_string())
    .bind(&next.creator_username)
    .bind(next.version)
    .bind(next.updated_at.to_rfc3339())
    .bind(next.id.to_string())
    .execute(&mut **tx)
    .await
    .context("Failed to update bid")?;

    Ok(next)
}

fn row_to_bid(row: BidRow) -> anyhow::Result<Bid> {
    Ok(Bid {
        id: Uuid::parse_str(&row.id).context("Invalid bid id")?,
        name: row.name,
        description: row.description,
        status: row.status.parse().map_err(|e: String| anyhow!(e))?,
        tender_id: Uuid::parse_str(&row.tender_id).context("Invalid bid tender id")?,
        author: BidAuthor::from_parts(&row.author_type, &row.author_id).map_err(|e| anyhow!(e))?,
        creator_username: row.creator_username,
        version: row.version,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    })
}

fn row_to_feedback(row: FeedbackRow) -> anyhow::Result<BidFeedback> {
    Ok(BidFeedback {
        id: Uuid::parse_str(&row.id).context("Invalid feedback id")?,
        bid_id: Uuid::parse_str(&row.bid_id).context("Invalid feedback bid id")?,
        username: row.username,
        review: row.review,
        created_at: parse_db_timestamp(&row.created_at),
    })
}
