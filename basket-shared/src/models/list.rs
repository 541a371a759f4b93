//! Shopping list model and status state machine
//!
//! # Status
//!
//! ```text
//! Active(1)    -> Completed(2) | Deleted(0)
//! Completed(2) -> Active(1)    | Deleted(0)
//! Deleted(0)   -> (terminal)
//! ```
//!
//! Writing `Deleted` also stamps `deleted_at` in the same statement, so a
//! list can never be observed with status 0 and a null `deleted_at` (the
//! table carries a CHECK for it as well).
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE lists (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     workspace_id UUID NOT NULL REFERENCES workspaces(id),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     title VARCHAR(255) NOT NULL,
//!     status SMALLINT NOT NULL DEFAULT 1,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::list_product::ListItemView;

/// List status, stored as SMALLINT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(into = "i16", try_from = "i16")]
pub enum ListStatus {
    Deleted = 0,
    Active = 1,
    Completed = 2,
}

/// Raised for a numeric status outside {0, 1, 2}
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid list status: {0}")]
pub struct InvalidListStatus(pub i64);

impl ListStatus {
    /// Parses the wire representation
    pub fn from_code(code: i64) -> Result<Self, InvalidListStatus> {
        match code {
            0 => Ok(ListStatus::Deleted),
            1 => Ok(ListStatus::Active),
            2 => Ok(ListStatus::Completed),
            other => Err(InvalidListStatus(other)),
        }
    }

    pub fn code(self) -> i16 {
        self as i16
    }

    /// Whether a list in this status may be moved to `next`
    ///
    /// Writing the current status again is accepted as a no-op, except for
    /// `Deleted`, which no write may leave or repeat.
    pub fn can_transition_to(self, next: ListStatus) -> bool {
        use ListStatus::*;

        matches!(
            (self, next),
            (Active, Active)
                | (Active, Completed)
                | (Active, Deleted)
                | (Completed, Completed)
                | (Completed, Active)
                | (Completed, Deleted)
        )
    }
}

impl From<ListStatus> for i16 {
    fn from(status: ListStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for ListStatus {
    type Error = InvalidListStatus;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        ListStatus::from_code(code as i64)
    }
}

/// A shopping list row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductList {
    pub id: Uuid,
    pub workspace_id: Uuid,

    /// Creator of the list
    pub user_id: Uuid,

    pub title: String,
    pub status: ListStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A list together with its visible items, as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct ListWithItems {
    #[serde(flatten)]
    pub list: ProductList,
    pub products: Vec<ListItemView>,
}

/// Input for creating a list
#[derive(Debug, Clone)]
pub struct CreateList {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
}

const LIST_COLUMNS: &str =
    "id, workspace_id, user_id, title, status, created_at, updated_at, deleted_at";

impl ProductList {
    /// Inserts an active list
    pub async fn create<'e, E>(executor: E, data: CreateList) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let list = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            INSERT INTO lists (workspace_id, user_id, title, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            LIST_COLUMNS
        ))
        .bind(data.workspace_id)
        .bind(data.user_id)
        .bind(data.title)
        .bind(ListStatus::Active)
        .fetch_one(executor)
        .await?;

        Ok(list)
    }

    /// Finds an active list of the given workspace
    pub async fn find_active_in_workspace<'e, E>(
        executor: E,
        workspace_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let list = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            SELECT {}
            FROM lists
            WHERE id = $2 AND workspace_id = $1 AND deleted_at IS NULL
            "#,
            LIST_COLUMNS
        ))
        .bind(workspace_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(list)
    }

    /// Like [`find_active_in_workspace`](Self::find_active_in_workspace) but
    /// takes a row lock, serializing concurrent edits of the same list
    ///
    /// Only meaningful inside a transaction.
    pub async fn lock_active_in_workspace<'e, E>(
        executor: E,
        workspace_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let list = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            SELECT {}
            FROM lists
            WHERE id = $2 AND workspace_id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
            LIST_COLUMNS
        ))
        .bind(workspace_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(list)
    }

    /// Lists the active lists of a workspace, newest first
    pub async fn list_active(pool: &PgPool, workspace_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let lists = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            SELECT {}
            FROM lists
            WHERE workspace_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
            LIST_COLUMNS
        ))
        .bind(workspace_id)
        .fetch_all(pool)
        .await?;

        Ok(lists)
    }

    /// Renames an active list
    pub async fn rename<'e, E>(executor: E, id: Uuid, title: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let list = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            UPDATE lists
            SET title = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            LIST_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .fetch_optional(executor)
        .await?;

        Ok(list)
    }

    /// Writes a new status; `Deleted` stamps `deleted_at` in the same UPDATE
    ///
    /// Callers validate the transition with [`ListStatus::can_transition_to`]
    /// first. Returns None if the list is no longer active.
    pub async fn write_status<'e, E>(
        executor: E,
        id: Uuid,
        status: ListStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let list = sqlx::query_as::<_, ProductList>(&format!(
            r#"
            UPDATE lists
            SET status = $2,
                deleted_at = CASE WHEN $2 = 0 THEN NOW() ELSE deleted_at END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            LIST_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(list)
    }
}
