//! Product model and database operations
//!
//! Products belong to exactly one workspace and are never shared across
//! workspaces. Every query here takes the workspace ID and scopes on it, so
//! a product ID from another workspace behaves exactly like a missing one.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE products (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     workspace_id UUID NOT NULL REFERENCES workspaces(id),
//!     title VARCHAR(255) NOT NULL,
//!     unit_type VARCHAR(50) NOT NULL DEFAULT '',
//!     price DOUBLE PRECISION NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,

    /// Unit the quantity is counted in ("pcs", "kg", ...)
    pub unit_type: String,

    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub workspace_id: Uuid,
    pub title: String,
    pub unit_type: String,
    pub price: f64,
}

/// Partial update; None fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub unit_type: Option<String>,
    pub price: Option<f64>,
}

const PRODUCT_COLUMNS: &str =
    "id, workspace_id, title, unit_type, price, created_at, updated_at, deleted_at";

/// Escapes LIKE wildcards so a search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Product {
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (workspace_id, title, unit_type, price)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(data.workspace_id)
        .bind(data.title)
        .bind(data.unit_type)
        .bind(data.price)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    /// Lists the active products of a workspace, optionally filtered by a
    /// case-insensitive title substring
    pub async fn list_active(
        pool: &PgPool,
        workspace_id: Uuid,
        title_filter: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = title_filter
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE workspace_id = $1
              AND deleted_at IS NULL
              AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY title ASC
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(workspace_id)
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(products)
    }

    /// Updates an active product of the given workspace
    ///
    /// The workspace scoping and the soft-delete filter are part of the
    /// UPDATE itself, so the check and the write cannot be separated by a
    /// concurrent delete. Returns None if no such product is visible.
    pub async fn update_in_workspace(
        pool: &PgPool,
        workspace_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET title = COALESCE($3, title),
                unit_type = COALESCE($4, unit_type),
                price = COALESCE($5, price),
                updated_at = NOW()
            WHERE id = $2 AND workspace_id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(workspace_id)
        .bind(id)
        .bind(data.title)
        .bind(data.unit_type)
        .bind(data.price)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Soft-deletes an active product of the given workspace
    ///
    /// List items pointing at the product stay on their lists but no longer
    /// show the product's name.
    pub async fn soft_delete_in_workspace(
        pool: &PgPool,
        workspace_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $2 AND workspace_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(workspace_id)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("milk"), "%milk%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_update_product_default_changes_nothing() {
        let update = UpdateProduct::default();
        assert!(update.title.is_none());
        assert!(update.unit_type.is_none());
        assert!(update.price.is_none());
    }
}
