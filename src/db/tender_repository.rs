//! Tender repository backed by SQLite

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{begin_write, parse_db_timestamp};
use super::repository::{StoreError, StoreResult, TenderFilter, TenderRepository};
use crate::models::{Page, Tender, Versioned};

const TENDER_COLUMNS: &str = "id, name, description, service_type, status, organization_id, creator_username, version, created_at, updated_at";
const HISTORY_COLUMNS: &str = "tender_id AS id, name, description, service_type, status, organization_id, creator_username, version, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: String,
    name: String,
    description: String,
    service_type: String,
    status: String,
    organization_id: String,
    creator_username: String,
    version: i32,
    created_at: String,
    updated_at: String,
}

#[derive(Clone)]
pub struct SqliteTenderRepository {
    pool: SqlitePool,
}

impl SqliteTenderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenderRepository for SqliteTenderRepository {
    async fn create(&self, tender: &Tender) -> StoreResult<Tender> {
        sqlx::query(
            r#"
            INSERT INTO tender (id, name, description, service_type, status, organization_id, creator_username, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tender.id.to_string())
        .bind(&tender.name)
        .bind(&tender.description)
        .bind(tender.service_type.as_str())
        .bind(tender.status.as_str())
        .bind(tender.organization_id.to_string())
        .bind(&tender.creator_username)
        .bind(tender.version)
        .bind(tender.created_at.to_rfc3339())
        .bind(tender.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create tender")?;

        self.get_by_id(tender.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Tender> {
        let sql = format!("SELECT {TENDER_COLUMNS} FROM tender WHERE id = ?");
        let row = sqlx::query_as::<_, TenderRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tender")?;

        match row {
            Some(row) => Ok(row_to_tender(row)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>> {
        let mut sql = format!("SELECT {TENDER_COLUMNS} FROM tender WHERE 1 = 1");

        if !filter.service_types.is_empty() {
            let placeholders = vec!["?"; filter.service_types.len()].join(", ");
            sql.push_str(&format!(" AND service_type IN ({placeholders})"));
        }
        if filter.creator_username.is_some() {
            sql.push_str(" AND creator_username = ?");
        }
        sql.push_str(" ORDER BY name, id LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, TenderRow>(&sql);
        for service_type in &filter.service_types {
            q = q.bind(service_type.as_str());
        }
        if let Some(ref username) = filter.creator_username {
            q = q.bind(username);
        }
        q = q.bind(page.limit as i64).bind(page.offset as i64);

        let rows = q
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tenders")?;

        rows.into_iter()
            .map(|row| row_to_tender(row).map_err(StoreError::from))
            .collect()
    }

    async fn update(&self, tender: &Tender) -> StoreResult<Tender> {
        let mut tx = begin_write(&self.pool)
            .await
            .context("Failed to begin tender update")?;

        let stored = fetch_current(&mut tx, tender.id).await?;
        let written = write_next_version(&mut tx, &stored, tender.clone()).await?;

        tx.commit().await.context("Failed to commit tender update")?;
        Ok(written)
    }

    async fn rollback_to_version(&self, id: Uuid, version: i32) -> StoreResult<Tender> {
        let mut tx = begin_write(&self.pool)
            .await
            .context("Failed to begin tender rollback")?;

        let stored = fetch_current(&mut tx, id).await?;

        let sql =
            format!("SELECT {HISTORY_COLUMNS} FROM tender_history WHERE tender_id = ? AND version = ?");
        let snapshot = sqlx::query_as::<_, TenderRow>(&sql)
            .bind(id.to_string())
            .bind(version)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read tender snapshot")?
            .ok_or(StoreError::VersionNotFound(version))?;

        let restored = row_to_tender(snapshot)?;
        let written = write_next_version(&mut tx, &stored, restored).await?;

        tx.commit()
            .await
            .context("Failed to commit tender rollback")?;
        Ok(written)
    }

    async fn history(&self, id: Uuid) -> StoreResult<Vec<Tender>> {
        let sql =
            format!("SELECT {HISTORY_COLUMNS} FROM tender_history WHERE tender_id = ? ORDER BY version");
        let rows = sqlx::query_as::<_, TenderRow>(&sql)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tender history")?;

        rows.into_iter()
            .map(|row| row_to_tender(row).map_err(StoreError::from))
            .collect()
    }
}

async fn fetch_current(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> StoreResult<Tender> {
    let sql = format!("SELECT {TENDER_COLUMNS} FROM tender WHERE id = ?");
    let row = sqlx::query_as::<_, TenderRow>(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to read current tender")?
        .ok_or(StoreError::NotFound)?;

    Ok(row_to_tender(row)?)
}

/// Snapshot `stored` into history and overwrite the current row with `next`
/// at `stored.version + 1`.
async fn write_next_version(
    tx: &mut Transaction<'_, Sqlite>,
    stored: &Tender,
    mut next: Tender,
) -> StoreResult<Tender> {
    sqlx::query(
        r#"
        INSERT INTO tender_history (tender_id, version, name, description, service_type, status, organization_id, creator_username, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stored.id.to_string())
    .bind(stored.version)
    .bind(&stored.name)
    .bind(&stored.description)
    .bind(stored.service_type.as_str())
    .bind(stored.status.as_str())
    .bind(stored.organization_id.to_string())
    .bind(&stored.creator_username)
    .bind(stored.created_at.to_rfc3339())
    .bind(stored.updated_at.to_rfc3339())
    .execute(&mut **tx)
    .await
    .context("Failed to write tender snapshot")?;

    next.stamp_after(stored, Utc::now());

    sqlx::query(
        r#"
        UPDATE tender
        SET name = ?, description = ?, service_type = ?, status = ?, organization_id = ?,
            creator_username = ?, version = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&next.name)
    .bind(&next.description)
    .bind(next.service_type.as_str())
    .bind(next.status.as_str())
    .bind(next.organization_id.to_string())
    .bind(&next.creator_username)
    .bind(next.version)
    .bind(next.updated_at.to_rfc3339())
    .bind(next.id.to_string())
    .execute(&mut **tx)
    .await
    .context("Failed to update tender")?;

    Ok(next)
}

fn row_to_tender(row: TenderRow) -> anyhow::Result<Tender> {
    Ok(Tender {
        id: Uuid::parse_str(&row.id).context("Invalid tender id")?,
        name: row.name,
        description: row.description,
        service_type: row.service_type.parse().map_err(|e: String| anyhow!(e))?,
        status: row.status.parse().map_err(|e: String| anyhow!(e))?,
        organization_id: Uuid::parse_str(&row.organization_id)
            .context("Invalid tender organization id")?,
        creator_username: row.creator_username,
        version: row.version,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    })
}
