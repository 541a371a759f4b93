//! Workspace membership model and database operations
//!
//! A membership row grants a non-owner user access to a workspace. The
//! owner never has a membership row; ownership and membership are separate
//! grants and the access check ORs them together.
//!
//! Removing a member stamps `deleted_at` on the active row. Adding the same
//! user again inserts a new row instead of clearing `deleted_at`, so the
//! history of grants is kept and nothing is resurrected implicitly.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE workspace_users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     workspace_id UUID NOT NULL REFERENCES workspaces(id),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX workspace_users_active_idx
//!     ON workspace_users (workspace_id, user_id) WHERE deleted_at IS NULL;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// How a user reaches a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    /// The workspace's owner
    Owner,

    /// Holder of an active membership row
    Member,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Owner => "owner",
            WorkspaceRole::Member => "member",
        }
    }
}

impl TryFrom<String> for WorkspaceRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "owner" => Ok(WorkspaceRole::Owner),
            "member" => Ok(WorkspaceRole::Member),
            other => Err(format!("unknown workspace role: {}", other)),
        }
    }
}

/// One membership grant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user with access to a workspace, as shown to collaborators
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkspaceUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,

    #[sqlx(try_from = "String")]
    pub role: WorkspaceRole,
}

const MEMBER_COLUMNS: &str = "id, workspace_id, user_id, created_at, updated_at, deleted_at";

impl WorkspaceMember {
    /// Inserts a fresh membership row
    ///
    /// # Errors
    ///
    /// A unique violation on `workspace_users_active_idx` if an active grant
    /// already exists (for example, a concurrent add of the same user).
    pub async fn create<'e, E>(
        executor: E,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let member = sqlx::query_as::<_, WorkspaceMember>(&format!(
            "INSERT INTO workspace_users (workspace_id, user_id) VALUES ($1, $2) RETURNING {}",
            MEMBER_COLUMNS
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Checks whether the user holds an active membership
    pub async fn has_active<'e, E>(
        executor: E,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM workspace_users
                WHERE workspace_id = $1 AND user_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Soft-deletes the active membership
    ///
    /// Returns false when there was no active membership to remove.
    pub async fn soft_delete_active<'e, E>(
        executor: E,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE workspace_users
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE workspace_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists everyone with access to a workspace: the owner first, then
    /// active members in the order they were added
    pub async fn list_users(pool: &PgPool, workspace_id: Uuid) -> Result<Vec<WorkspaceUser>, sqlx::Error> {
        let users = sqlx::query_as::<_, WorkspaceUser>(
            r#"
            SELECT id, email, name, role FROM (
                SELECT u.id, u.email, u.name, 'owner' AS role, 0 AS rank, w.created_at AS since
                FROM workspaces w
                JOIN users u ON u.id = w.owner_id AND u.deleted_at IS NULL
                WHERE w.id = $1 AND w.deleted_at IS NULL
                UNION ALL
                SELECT u.id, u.email, u.name, 'member' AS role, 1 AS rank, wu.created_at AS since
                FROM workspace_users wu
                JOIN users u ON u.id = wu.user_id AND u.deleted_at IS NULL
                WHERE wu.workspace_id = $1 AND wu.deleted_at IS NULL
            ) AS access
            ORDER BY rank, since
            "#,
        )
        .bind(workspace_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
