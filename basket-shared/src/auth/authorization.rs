//! Workspace membership authority
//!
//! A user can access a workspace iff the workspace exists, is not
//! soft-deleted, and the user either owns it or holds an active membership.
//! A deleted workspace is inaccessible even to its owner.
//!
//! The decision itself is the pure function [`decide_access`]; the async
//! helpers only load its inputs and turn a refusal into an [`AuthzError`].
//!
//! # Example
//!
//! ```no_run
//! use basket_shared::auth::authorization::require_workspace_access;
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, workspace_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = pool.acquire().await?;
//! let (workspace, role) = require_workspace_access(&mut conn, workspace_id, user_id).await?;
//! println!("{} reaches {} as {}", user_id, workspace.name, role.as_str());
//! # Ok(())
//! # }
//! ```

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::membership::{WorkspaceMember, WorkspaceRole};
use crate::models::user::User;
use crate::models::workspace::Workspace;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Workspace absent or soft-deleted
    #[error("Workspace {0} not found")]
    WorkspaceNotFound(Uuid),

    #[error("Not a member of workspace {0}")]
    NotMember(Uuid),

    #[error("Only the owner can manage workspace {0}")]
    NotOwner(Uuid),

    #[error("You cannot add yourself to a workspace")]
    SelfMembership,

    /// Target user absent or soft-deleted
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("User {0} is already a member of this workspace")]
    AlreadyMember(Uuid),

    #[error("User {0} is not a member of this workspace")]
    MembershipNotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(WorkspaceRole),
    NotFound,
    Denied,
}

/// Decides access from a loaded workspace and the caller's membership
pub fn decide_access(
    workspace: Option<&Workspace>,
    user_id: Uuid,
    has_membership: bool,
) -> AccessDecision {
    match workspace {
        None => AccessDecision::NotFound,
        Some(ws) if ws.is_deleted() => AccessDecision::NotFound,
        Some(ws) if ws.is_owned_by(user_id) => AccessDecision::Granted(WorkspaceRole::Owner),
        Some(_) if has_membership => AccessDecision::Granted(WorkspaceRole::Member),
        Some(_) => AccessDecision::Denied,
    }
}

async fn load_decision(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> Result<(Option<Workspace>, AccessDecision), sqlx::Error> {
    let workspace = Workspace::find_by_id(&mut *conn, workspace_id).await?;

    // Membership only matters for a live workspace the caller does not own
    let has_membership = match &workspace {
        Some(ws) if !ws.is_deleted() && !ws.is_owned_by(user_id) => {
            WorkspaceMember::has_active(&mut *conn, workspace_id, user_id).await?
        }
        _ => false,
    };

    let decision = decide_access(workspace.as_ref(), user_id, has_membership);
    Ok((workspace, decision))
}

/// Whether `user_id` can access `workspace_id`
pub async fn can_access(pool: &PgPool, workspace_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let (_, decision) = load_decision(&mut conn, workspace_id, user_id).await?;
    Ok(matches!(decision, AccessDecision::Granted(_)))
}

/// Requires owner or member access, returning the workspace and the role
///
/// Pass a transaction's connection to run the check inside it.
pub async fn require_workspace_access(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> Result<(Workspace, WorkspaceRole), AuthzError> {
    match load_decision(conn, workspace_id, user_id).await? {
        (Some(ws), AccessDecision::Granted(role)) => Ok((ws, role)),
        (_, AccessDecision::Denied) => {
            tracing::warn!(workspace_id = %workspace_id, user_id = %user_id, "Workspace access denied");
            Err(AuthzError::NotMember(workspace_id))
        }
        _ => Err(AuthzError::WorkspaceNotFound(workspace_id)),
    }
}

/// Requires the caller to own the (live) workspace
pub async fn require_workspace_owner(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> Result<Workspace, AuthzError> {
    match require_workspace_access(conn, workspace_id, user_id).await {
        Ok((ws, WorkspaceRole::Owner)) => Ok(ws),
        Ok((_, WorkspaceRole::Member)) | Err(AuthzError::NotMember(_)) => {
            tracing::warn!(workspace_id = %workspace_id, user_id = %user_id, "Owner-only action refused");
            Err(AuthzError::NotOwner(workspace_id))
        }
        Err(e) => Err(e),
    }
}

/// Grants `target_user_id` access to a workspace owned by `actor_id`
///
/// Runs in one transaction. Checks, in order: owner gate, self-add, target
/// user exists, no active membership yet.
pub async fn add_member(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    target_user_id: Uuid,
) -> Result<WorkspaceMember, AuthzError> {
    let mut tx = pool.begin().await?;

    require_workspace_owner(&mut tx, workspace_id, actor_id).await?;

    if target_user_id == actor_id {
        return Err(AuthzError::SelfMembership);
    }

    if User::find_active_by_id(&mut *tx, target_user_id).await?.is_none() {
        return Err(AuthzError::UserNotFound(target_user_id));
    }

    if WorkspaceMember::has_active(&mut *tx, workspace_id, target_user_id).await? {
        return Err(AuthzError::AlreadyMember(target_user_id));
    }

    let member = WorkspaceMember::create(&mut *tx, workspace_id, target_user_id).await?;

    tx.commit().await?;

    tracing::info!(
        workspace_id = %workspace_id,
        user_id = %target_user_id,
        "Member added"
    );

    Ok(member)
}

/// Revokes the active membership of `target_user_id`
pub async fn remove_member(
    pool: &PgPool,
    workspace_id: Uuid,
    actor_id: Uuid,
    target_user_id: Uuid,
) -> Result<(), AuthzError> {
    let mut tx = pool.begin().await?;

    require_workspace_owner(&mut tx, workspace_id, actor_id).await?;

    if !WorkspaceMember::soft_delete_active(&mut *tx, workspace_id, target_user_id).await? {
        return Err(AuthzError::MembershipNotFound(target_user_id));
    }

    tx.commit().await?;

    tracing::info!(
        workspace_id = %workspace_id,
        user_id = %target_user_id,
        "Member removed"
    );

    Ok(())
}
