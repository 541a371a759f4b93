//! Product catalog endpoints
//!
//! All routes require access to the workspace. Update and delete are
//! scoped to the path's workspace in the same statement that writes, so a
//! product of another workspace answers 404 exactly like a missing one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use basket_shared::{
    auth::middleware::AuthContext,
    models::product::{CreateProduct, Product, UpdateProduct},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{auth::MessageResponse, not_blank, workspaces::accessible_workspace};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive title substring
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,

    #[serde(default, alias = "amount_type")]
    #[validate(length(max = 50, message = "Unit type must be at most 50 characters"))]
    pub unit_type: String,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be empty"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: Option<String>,

    #[serde(alias = "amount_type")]
    #[validate(length(max = 50, message = "Unit type must be at most 50 characters"))]
    pub unit_type: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
}

fn product_not_found(product_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Product {} not found", product_id))
}

/// GET /workspaces/:workspace_id/products
pub async fn list_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let products = Product::list_active(&state.db, workspace_id, query.name.as_deref()).await?;

    tracing::debug!(workspace_id = %workspace_id, count = products.len(), "Listed products");

    Ok(Json(products))
}

/// POST /workspaces/:workspace_id/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()?;

    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let product = Product::create(
        &state.db,
        CreateProduct {
            workspace_id,
            title: req.title.trim().to_string(),
            unit_type: req.unit_type.trim().to_string(),
            price: req.price,
        },
    )
    .await?;

    tracing::info!(workspace_id = %workspace_id, product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /workspaces/:workspace_id/products/:product_id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, product_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;

    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    let update = UpdateProduct {
        title: req.title.map(|t| t.trim().to_string()),
        unit_type: req.unit_type.map(|u| u.trim().to_string()),
        price: req.price,
    };

    let product = Product::update_in_workspace(&state.db, workspace_id, product_id, update)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;

    Ok(Json(product))
}

/// DELETE /workspaces/:workspace_id/products/:product_id
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((workspace_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    accessible_workspace(&state, workspace_id, auth.user_id).await?;

    if !Product::soft_delete_in_workspace(&state.db, workspace_id, product_id).await? {
        return Err(product_not_found(product_id));
    }

    tracing::info!(workspace_id = %workspace_id, product_id = %product_id, "Product deleted");

    Ok(MessageResponse::new("Product deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_product_title_rejected() {
        let create: CreateProductRequest =
            serde_json::from_str(r#"{"title":"   ","unit_type":"kg"}"#).unwrap();
        let err = create.validate().unwrap_err();
        assert!(err.field_errors().contains_key("title"));

        let update: UpdateProductRequest = serde_json::from_str(r#"{"title":"\t"}"#).unwrap();
        assert!(update.validate().is_err());

        let price_only: UpdateProductRequest = serde_json::from_str(r#"{"price":2.5}"#).unwrap();
        assert!(price_only.validate().is_ok());
    }

    #[test]
    fn test_unit_type_alias() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"title":"Milk","amount_type":"l","price":1.0}"#).unwrap();
        assert_eq!(req.unit_type, "l");
        assert!(req.validate().is_ok());
    }
}
