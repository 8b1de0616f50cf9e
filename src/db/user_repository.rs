//! Employee lookup backed by SQLite

use anyhow::Context;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_db_timestamp;
use super::repository::{StoreError, StoreResult, UserRepository};
use crate::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an employee record. Accounts are normally provisioned externally.
    pub async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employee (id, username, first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(user.first_name.as_deref())
        .bind(user.last_name.as_deref())
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert employee")?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, created_at, updated_at
            FROM employee
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get employee")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(User {
            id: Uuid::parse_str(&row.id).context("Invalid employee id")?,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: parse_db_timestamp(&row.created_at),
            updated_at: parse_db_timestamp(&row.updated_at),
        })
    }
}
