//! Organization and responsibility lookups backed by SQLite

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_db_timestamp;
use super::repository::{OrganizationRepository, StoreError, StoreResult};
use crate::models::Organization;

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    description: Option<String>,
    #[sqlx(rename = "type")]
    organization_type: String,
    created_at: String,
    updated_at: String,
}

#[derive(Clone)]
pub struct SqliteOrganizationRepository {
    pool: SqlitePool,
}

impl SqliteOrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, org: &Organization) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO organization (id, name, description, type, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(org.id.to_string())
        .bind(&org.name)
        .bind(org.description.as_deref())
        .bind(org.organization_type.as_str())
        .bind(org.created_at.to_rfc3339())
        .bind(org.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert organization")?;

        Ok(())
    }

    /// Make `user_id` responsible for `organization_id`
    pub async fn add_responsible(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO organization_responsible (id, organization_id, user_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to insert organization responsible")?;

        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for SqliteOrganizationRepository {
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Organization> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, description, type, created_at, updated_at
            FROM organization
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get organization")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(Organization {
            id: Uuid::parse_str(&row.id).context("Invalid organization id")?,
            name: row.name,
            description: row.description,
            organization_type: row
                .organization_type
                .parse()
                .map_err(|e: String| anyhow!(e))?,
            created_at: parse_db_timestamp(&row.created_at),
            updated_at: parse_db_timestamp(&row.updated_at),
        })
    }

    async fn is_responsible(&self, organization_id: Uuid, username: &str) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM organization_responsible r
            JOIN employee e ON e.id = r.user_id
            WHERE r.organization_id = ? AND e.username = ?
            LIMIT 1
            "#,
        )
        .bind(organization_id.to_string())
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check organization responsibility")?;

        Ok(found.is_some())
    }

    async fn is_responsible_for_tender(
        &self,
        tender_id: Uuid,
        username: &str,
    ) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM tender t
            JOIN organization_responsible r ON r.organization_id = t.organization_id
            JOIN employee e ON e.id = r.user_id
            WHERE t.id = ? AND e.username = ?
            LIMIT 1
            "#,
        )
        .bind(tender_id.to_string())
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check tender responsibility")?;

        Ok(found.is_some())
    }
}
