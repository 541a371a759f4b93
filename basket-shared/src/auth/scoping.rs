//! Resource scoping guard
//!
//! Before a mutation references a product by ID, the product must exist,
//! be active and belong to the workspace named in the request path. The
//! check takes a `FOR SHARE` lock on the product row, so when it runs on
//! the mutation's transaction the product cannot be deleted or moved until
//! that transaction ends.

use sqlx::PgConnection;
use uuid::Uuid;

/// Error type for scoping checks
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Product absent, soft-deleted or owned by another workspace
    #[error("Product {product_id} does not belong to workspace {workspace_id}")]
    ProductOutOfScope {
        workspace_id: Uuid,
        product_id: Uuid,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Verifies one product against the workspace and locks it
pub async fn require_product_in_workspace(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    product_id: Uuid,
) -> Result<(), ScopeError> {
    let found: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM products
        WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL
        FOR SHARE
        "#,
    )
    .bind(product_id)
    .bind(workspace_id)
    .fetch_optional(&mut *conn)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(
                workspace_id = %workspace_id,
                product_id = %product_id,
                "Rejected out-of-scope product reference"
            );
            Err(ScopeError::ProductOutOfScope {
                workspace_id,
                product_id,
            })
        }
    }
}

/// Verifies every product in `product_ids`, failing on the first outsider
pub async fn require_products_in_workspace(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    product_ids: impl IntoIterator<Item = Uuid>,
) -> Result<(), ScopeError> {
    for product_id in product_ids {
        require_product_in_workspace(conn, workspace_id, product_id).await?;
    }

    Ok(())
}
