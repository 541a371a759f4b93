//! User model and credential store
//!
//! Users hold the Argon2id password hash and the SHA-256 digest of their
//! current session token. Login replaces the digest, logout clears it, so a
//! token is only usable while it is the user's *current* token.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email VARCHAR(255) NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     name VARCHAR(255) NOT NULL,
//!     active_token_hash VARCHAR(64),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX users_email_active_idx ON users (LOWER(email)) WHERE deleted_at IS NULL;
//! ```
//!
//! # Example
//!
//! ```no_run
//! use basket_shared::models::user::{CreateUser, User};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! let user = User::create(&pool, CreateUser {
//!     email: "ann@example.com".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//!     name: "Ann".to_string(),
//! })
//! .await?;
//!
//! let found = User::find_active_by_email(&pool, "ANN@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique among active users (case-insensitive)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// SHA-256 hex digest of the current session token, None when logged out
    #[serde(skip_serializing)]
    pub active_token_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id hash, never the plaintext password
    pub password_hash: String,

    pub name: String,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, active_token_hash, created_at, updated_at, deleted_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// A unique violation on `users_email_active_idx` when an active user
    /// already holds the email.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds an active (not soft-deleted) user by ID
    pub async fn find_active_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds an active user by email, ignoring case
    pub async fn find_active_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replaces (or with `None`, clears) the stored session token digest
    ///
    /// Returns false if the user does not exist or is soft-deleted.
    pub async fn set_active_token_hash(
        pool: &PgPool,
        id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET active_token_hash = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-deletes the account and revokes its session
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), active_token_hash = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
