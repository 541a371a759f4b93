//! Shopping list endpoints
//!
//! Every mutation runs in one transaction: the access check, the row lock
//! on the list, the scoping check of each referenced product and the writes
//! all commit together or not at all.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use basket_shared::{
    auth::{
        authorization::require_workspace_access, middleware::AuthContext,
        scoping::require_products_in_workspace,
    },
    models::{
        list::{CreateList, ListStatus, ListWithItems, ProductList},
        list_product::{normalize_targets, ListItemTarget, ListItemView, ListProduct},
    },
};
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::{auth::MessageResponse, not_blank, workspaces::accessible_workspace};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ListItemRequest {
    pub product_id: Uuid,

    /// Missing or non-positive quantities become 1
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,

    #[serde(default)]
    pub products: Vec<ListItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListRequest {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be empty"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: Option<String>,

    pub status: Option<i64>,

    /// The complete desired item set; omitted leaves items untouched
    pub products: Option<Vec<ListItemRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub checked: bool,
}

fn list_not_found(list_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("List {} not found", list_id))
}

fn targets_from(items: &[ListItemRequest]) -> Vec<ListItemTarget> {
    normalize_targets(
        items
            .iter()
            .map(|item| ListItemTarget::new(item.product_id, item.quantity)),
    )
}

fn check_transition(current: ListStatus, next: ListStatus) -> ApiResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Cannot change list status from {} to {}",
            current.code(),
            next.code()
        )))
    }
}

/// Checks access and locks the active list for the rest of the transaction
async fn lock_list(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    list_id: Uuid,
    user_id: Uuid,
) -> ApiResult<ProductList> {
    require_workspace_access(&mut *conn, workspace_id, user_id).await?;

    ProductList::lock_active_in_workspace(&mut *conn, workspace_id, list_id)
        .await?
        .ok_or_else(|| list_not_found(list_id))
}

async fn with_items(conn: &mut PgConnection, list: ProductList) -> ApiResult<ListWithItems> {
    let products = ListProduct::list_visible_for_lists(&mut *conn, &[list.id]).await?;
    Ok(ListWithItems { list, products })
}

/// Applies a status write, validating the transition first
async fn apply_status(
    conn: &mut PgConnection,
    list: ProductList,
    next: ListStatus,
) -> ApiResult<ProductList> {
    check_transition(list.status, next)?;

    if list.status == next {
        return Ok(list);
    }

    let updated = ProductList::write_status(&mut *conn, list.id, next)
        .await?
        .ok_or_else(|| list_not_found(list.id))?;

    tracing::info!(
        list_id = %updated.id,
        from = list.status.code(),
        to = next.code(),
        "List status changed"
    );

    Ok(updated)
}

/// GET /workspaces/:workspace_id/product-lists
pub async fn list_lists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ListWithItems>>> {
    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let lists = ProductList::list_active(&state.db, workspace_id).await?;
    let ids: Vec<Uuid> = lists.iter().map(|l| l.id).collect();

    let mut items_by_list: HashMap<Uuid, Vec<ListItemView>> = HashMap::new();
    for item in ListProduct::list_visible_for_lists(&state.db, &ids).await? {
        items_by_list.entry(item.list_id).or_default().push(item);
    }

    let response = lists
        .into_iter()
        .map(|list| {
            let products = items_by_list.remove(&list.id).unwrap_or_default();
            ListWithItems { list, products }
        })
        .collect();

    Ok(Json(response))
}

/// GET /workspaces/:workspace_id/product-lists/:list_id
pub async fn get_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, list_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ListWithItems>> {
    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let mut conn = state.db.acquire().await?;

    let list = ProductList::find_active_in_workspace(&mut *conn, workspace_id, list_id)
        .await?
        .ok_or_else(|| list_not_found(list_id))?;

    Ok(Json(with_items(&mut conn, list).await?))
}

/// POST /workspaces/:workspace_id/product-lists
pub async fn create_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<ListWithItems>)> {
    req.validate()?;

    let targets = targets_from(&req.products);

    let mut tx = state.db.begin().await?;

    require_workspace_access(&mut tx, workspace_id, auth.user_id).await?;
    require_products_in_workspace(&mut tx, workspace_id, targets.iter().map(|t| t.product_id).collect::<Vec<_>>())
        .await?;

    let list = ProductList::create(
        &mut *tx,
        CreateList {
            workspace_id,
            user_id: auth.user_id,
            title: req.title.trim().to_string(),
        },
    )
    .await?;

    for target in &targets {
        ListProduct::insert(&mut *tx, list.id, *target).await?;
    }

    let response = with_items(&mut tx, list).await?;

    tx.commit().await?;

    tracing::info!(
        workspace_id = %workspace_id,
        list_id = %response.list.id,
        items = targets.len(),
        "List created"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH /workspaces/:workspace_id/product-lists/:list_id
///
/// Applies, in order: item reconciliation, rename, status change.
pub async fn update_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, list_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateListRequest>,
) -> ApiResult<Json<ListWithItems>> {
    req.validate()?;

    let next_status = req.status.map(ListStatus::from_code).transpose()?;

    let mut tx = state.db.begin().await?;

    let mut list = lock_list(&mut tx, workspace_id, list_id, auth.user_id).await?;

    if let Some(items) = &req.products {
        let targets = targets_from(items);

        require_products_in_workspace(&mut tx, workspace_id, targets.iter().map(|t| t.product_id).collect::<Vec<_>>())
            .await?;

        let outcome = ListProduct::reconcile(&mut tx, list.id, &targets).await?;

        tracing::info!(
            list_id = %list.id,
            updated = outcome.updated,
            inserted = outcome.inserted,
            removed = outcome.removed,
            "List items reconciled"
        );
    }

    if let Some(title) = &req.title {
        list = ProductList::rename(&mut *tx, list.id, title.trim())
            .await?
            .ok_or_else(|| list_not_found(list_id))?;
    }

    if let Some(next) = next_status {
        list = apply_status(&mut tx, list, next).await?;
    }

    let response = with_items(&mut tx, list).await?;

    tx.commit().await?;

    Ok(Json(response))
}

/// PATCH /workspaces/:workspace_id/product-lists/:list_id/status
pub async fn update_list_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, list_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ListWithItems>> {
    let next = ListStatus::from_code(req.status)?;

    let mut tx = state.db.begin().await?;

    let list = lock_list(&mut tx, workspace_id, list_id, auth.user_id).await?;
    let list = apply_status(&mut tx, list, next).await?;
    let response = with_items(&mut tx, list).await?;

    tx.commit().await?;

    Ok(Json(response))
}

/// PATCH /workspaces/:workspace_id/product-lists/:list_id/products/:product_id
pub async fn update_list_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, list_id, product_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<ListProduct>> {
    let mut tx = state.db.begin().await?;

    let list = lock_list(&mut tx, workspace_id, list_id, auth.user_id).await?;

    let item = ListProduct::set_checked(&mut *tx, list.id, product_id, req.checked)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Product {} is not on list {}", product_id, list_id))
        })?;

    tx.commit().await?;

    Ok(Json(item))
}

/// DELETE /workspaces/:workspace_id/product-lists/:list_id/products/:product_id
pub async fn remove_list_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, list_id, product_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;

    let list = lock_list(&mut tx, workspace_id, list_id, auth.user_id).await?;

    if !ListProduct::soft_delete_active(&mut *tx, list.id, product_id).await? {
        return Err(ApiError::NotFound(format!(
            "Product {} is not on list {}",
            product_id, list_id
        )));
    }

    tx.commit().await?;

    tracing::info!(list_id = %list_id, product_id = %product_id, "Product removed from list");

    Ok(MessageResponse::new("Product removed from list"))
}
