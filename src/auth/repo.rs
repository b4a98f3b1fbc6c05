use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::{auth::repo_types::User, error::ApiError};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Email already registered")]
    EmailTaken,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::EmailTaken => ApiError::Conflict(err.to_string()),
            RepoError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Persistence for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive: rows stored with mixed-case emails still match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user; a duplicate email yields [`RepoError::EmailTaken`].
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepoError>;

    /// Replace the password hash. Returns `false` when no row has that id.
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password AS password_hash, username
            FROM users
            WHERE lower(email) = lower($1)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password AS password_hash, username
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RepoError::EmailTaken,
            other => RepoError::Database(other),
        })?;
        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = $1
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
