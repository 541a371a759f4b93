//! Workspace model and database operations
//!
//! A workspace is the tenant boundary: it owns products and lists and is
//! owned by exactly one user. Other users reach it only through
//! [`WorkspaceMember`](super::membership::WorkspaceMember) rows.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE workspaces (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(255) NOT NULL,
//!     owner_id UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Workspace model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workspace {
    /// Unique workspace ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// The owning user
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete timestamp; a deleted workspace is inaccessible to everyone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Workspace {
    /// Whether the workspace has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `user_id` owns this workspace
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Input for creating a new workspace
#[derive(Debug, Clone)]
pub struct CreateWorkspace {
    pub name: String,
    pub owner_id: Uuid,
}

const WORKSPACE_COLUMNS: &str = "id, name, owner_id, created_at, updated_at, deleted_at";

impl Workspace {
    /// Creates a workspace owned by `data.owner_id`
    pub async fn create(pool: &PgPool, data: CreateWorkspace) -> Result<Self, sqlx::Error> {
        let workspace = sqlx::query_as::<_, Workspace>(&format!(
            "INSERT INTO workspaces (name, owner_id) VALUES ($1, $2) RETURNING {}",
            WORKSPACE_COLUMNS
        ))
        .bind(data.name)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(workspace)
    }

    /// Finds a workspace by ID, including soft-deleted ones
    ///
    /// Only the access checks use this; they need to tell "deleted" apart
    /// from "never existed" for logging, and treat both as not found.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let workspace = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {} FROM workspaces WHERE id = $1",
            WORKSPACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(workspace)
    }

    /// Lists the active workspaces owned by a user, newest first
    pub async fn list_owned(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let workspaces = sqlx::query_as::<_, Workspace>(&format!(
            r#"
            SELECT {}
            FROM workspaces
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
            WORKSPACE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(workspaces)
    }

    /// Renames an active workspace
    ///
    /// Returns None if the workspace is missing or soft-deleted.
    pub async fn rename<'e, E>(executor: E, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let workspace = sqlx::query_as::<_, Workspace>(&format!(
            r#"
            UPDATE workspaces
            SET name = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            WORKSPACE_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(workspace)
    }

    /// Soft-deletes a workspace
    ///
    /// Products, lists and memberships keep their rows; they become
    /// unreachable because every access check fails on a deleted workspace.
    pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE workspaces
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
