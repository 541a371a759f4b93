//! Workspace endpoints
//!
//! Reading, renaming and deleting a workspace and managing its members
//! require ownership. Listing collaborators only requires access.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use basket_shared::{
    auth::{
        authorization::{self, require_workspace_access, require_workspace_owner},
        middleware::AuthContext,
    },
    models::{
        membership::{WorkspaceMember, WorkspaceUser},
        workspace::{CreateWorkspace, Workspace},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{auth::MessageResponse, not_blank};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize, Validate)]
pub struct WorkspaceRequest {
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
}

/// Loads the workspace if the caller owns it or is a member
pub(crate) async fn accessible_workspace(
    state: &AppState,
    workspace_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Workspace> {
    let mut conn = state.db.acquire().await?;
    let (workspace, _) = require_workspace_access(&mut conn, workspace_id, user_id).await?;
    Ok(workspace)
}

fn workspace_not_found(workspace_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Workspace {} not found", workspace_id))
}

async fn owned_workspace(state: &AppState, workspace_id: Uuid, user_id: Uuid) -> ApiResult<Workspace> {
    let mut conn = state.db.acquire().await?;
    Ok(require_workspace_owner(&mut conn, workspace_id, user_id).await?)
}

/// POST /workspaces
pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<WorkspaceRequest>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    req.validate()?;

    let workspace = Workspace::create(
        &state.db,
        CreateWorkspace {
            name: req.name.trim().to_string(),
            owner_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(workspace_id = %workspace.id, owner_id = %auth.user_id, "Workspace created");

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /workspaces
pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Workspace>>> {
    let workspaces = Workspace::list_owned(&state.db, auth.user_id).await?;
    Ok(Json(workspaces))
}

/// GET /workspaces/:workspace_id
pub async fn get_workspace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Workspace>> {
    let workspace = owned_workspace(&state, workspace_id, auth.user_id).await?;
    Ok(Json(workspace))
}

/// PATCH /workspaces/:workspace_id
pub async fn update_workspace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<WorkspaceRequest>,
) -> ApiResult<Json<Workspace>> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    require_workspace_owner(&mut tx, workspace_id, auth.user_id).await?;

    let workspace = Workspace::rename(&mut *tx, workspace_id, req.name.trim())
        .await?
        .ok_or_else(|| workspace_not_found(workspace_id))?;

    tx.commit().await?;

    Ok(Json(workspace))
}

/// DELETE /workspaces/:workspace_id
pub async fn delete_workspace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;

    require_workspace_owner(&mut tx, workspace_id, auth.user_id).await?;

    if !Workspace::soft_delete(&mut *tx, workspace_id).await? {
        return Err(workspace_not_found(workspace_id));
    }

    tx.commit().await?;

    tracing::info!(workspace_id = %workspace_id, "Workspace deleted");

    Ok(MessageResponse::new("Workspace deleted successfully"))
}

/// POST /workspaces/:workspace_id/add_user/:user_id
pub async fn add_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let member: WorkspaceMember =
        authorization::add_member(&state.db, workspace_id, auth.user_id, user_id).await?;

    tracing::debug!(membership_id = %member.id, "Membership created");

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User added to workspace"),
    ))
}

/// DELETE /workspaces/:workspace_id/remove_user/:user_id
pub async fn remove_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    authorization::remove_member(&state.db, workspace_id, auth.user_id, user_id).await?;

    Ok(MessageResponse::new("User removed from workspace"))
}

/// GET /workspaces/:workspace_id/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<WorkspaceUser>>> {
    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let users = WorkspaceMember::list_users(&state.db, workspace_id).await?;
    Ok(Json(users))
}
