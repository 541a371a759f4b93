//! List items and list reconciliation
//!
//! A list item associates a product with a list, carrying a quantity and a
//! checked flag. At most one *active* item exists per (list, product); a
//! soft-deleted item is history and re-adding the product inserts a new row.
//!
//! # Reconciliation
//!
//! Replacing a list's product set is a diff, not a rewrite:
//!
//! 1. every target whose product already has an active item gets its
//!    quantity updated
//! 2. every other target is inserted as a fresh item
//! 3. every active item whose product is not in the target set is
//!    soft-deleted
//!
//! [`ListProduct::reconcile`] runs the three steps on one connection; the
//! caller owns the transaction and commits only when all of them succeed.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE list_products (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     list_id UUID NOT NULL REFERENCES lists(id),
//!     product_id UUID NOT NULL REFERENCES products(id),
//!     quantity INTEGER NOT NULL DEFAULT 1,
//!     checked BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX list_products_active_idx
//!     ON list_products (list_id, product_id) WHERE deleted_at IS NULL;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Quantity used when a request gives none or a non-positive one
pub const DEFAULT_QUANTITY: i32 = 1;

/// One list item row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListProduct {
    pub id: Uuid,
    pub list_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A list item as shown inside a list response
///
/// `name` is the product title, or None once the product is soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListItemView {
    pub list_id: Uuid,
    pub product_id: Uuid,
    pub name: Option<String>,
    pub quantity: i32,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Desired state of one item in a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItemTarget {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl ListItemTarget {
    pub fn new(product_id: Uuid, quantity: Option<i32>) -> Self {
        Self {
            product_id,
            quantity: normalize_quantity(quantity),
        }
    }
}

/// What a reconciliation changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub updated: u64,
    pub inserted: u64,
    pub removed: u64,
}

/// Maps a missing or non-positive quantity to [`DEFAULT_QUANTITY`]
pub fn normalize_quantity(quantity: Option<i32>) -> i32 {
    match quantity {
        Some(q) if q > 0 => q,
        _ => DEFAULT_QUANTITY,
    }
}

/// Collapses repeated product IDs, the last occurrence's quantity winning
///
/// Order follows each product's first appearance. Quantities are
/// normalized on the way through.
pub fn normalize_targets(targets: impl IntoIterator<Item = ListItemTarget>) -> Vec<ListItemTarget> {
    let mut out: Vec<ListItemTarget> = Vec::new();

    for target in targets {
        let quantity = normalize_quantity(Some(target.quantity));
        match out.iter_mut().find(|t| t.product_id == target.product_id) {
            Some(existing) => existing.quantity = quantity,
            None => out.push(ListItemTarget {
                product_id: target.product_id,
                quantity,
            }),
        }
    }

    out
}

const ITEM_COLUMNS: &str =
    "id, list_id, product_id, quantity, checked, created_at, updated_at, deleted_at";

impl ListProduct {
    /// Inserts a fresh active item
    ///
    /// # Errors
    ///
    /// A unique violation on `list_products_active_idx` if the product
    /// already has an active item on the list.
    pub async fn insert<'e, E>(
        executor: E,
        list_id: Uuid,
        target: ListItemTarget,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let item = sqlx::query_as::<_, ListProduct>(&format!(
            r#"
            INSERT INTO list_products (list_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .bind(target.product_id)
        .bind(target.quantity)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    /// Brings the active items of a list in line with `targets`
    ///
    /// `targets` should already be passed through [`normalize_targets`] and
    /// every product in it checked against the list's workspace on the same
    /// connection. An empty target set soft-deletes every active item.
    pub async fn reconcile(
        conn: &mut PgConnection,
        list_id: Uuid,
        targets: &[ListItemTarget],
    ) -> Result<ReconcileOutcome, sqlx::Error> {
        let mut outcome = ReconcileOutcome::default();

        for target in targets {
            let updated = sqlx::query(
                r#"
                UPDATE list_products
                SET quantity = $3, updated_at = NOW()
                WHERE list_id = $1 AND product_id = $2 AND deleted_at IS NULL
                "#,
            )
            .bind(list_id)
            .bind(target.product_id)
            .bind(target.quantity)
            .execute(&mut *conn)
            .await?;

            if updated.rows_affected() > 0 {
                outcome.updated += 1;
            } else {
                Self::insert(&mut *conn, list_id, *target).await?;
                outcome.inserted += 1;
            }
        }

        let keep: Vec<Uuid> = targets.iter().map(|t| t.product_id).collect();

        let removed = sqlx::query(
            r#"
            UPDATE list_products
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE list_id = $1
              AND deleted_at IS NULL
              AND NOT (product_id = ANY($2))
            "#,
        )
        .bind(list_id)
        .bind(&keep)
        .execute(&mut *conn)
        .await?;

        outcome.removed = removed.rows_affected();

        Ok(outcome)
    }

    /// Soft-deletes the active item for a product; false if there was none
    pub async fn soft_delete_active<'e, E>(
        executor: E,
        list_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE list_products
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE list_id = $1 AND product_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(list_id)
        .bind(product_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the checked flag of the active item for a product
    pub async fn set_checked<'e, E>(
        executor: E,
        list_id: Uuid,
        product_id: Uuid,
        checked: bool,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let item = sqlx::query_as::<_, ListProduct>(&format!(
            r#"
            UPDATE list_products
            SET checked = $3, updated_at = NOW()
            WHERE list_id = $1 AND product_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(list_id)
        .bind(product_id)
        .bind(checked)
        .fetch_optional(executor)
        .await?;

        Ok(item)
    }

    /// Loads the visible items of several lists in one query
    ///
    /// Soft-deleted items are skipped. A soft-deleted product keeps its item
    /// visible but contributes no name.
    pub async fn list_visible_for_lists<'e, E>(
        executor: E,
        list_ids: &[Uuid],
    ) -> Result<Vec<ListItemView>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let items = sqlx::query_as::<_, ListItemView>(
            r#"
            SELECT lp.list_id, lp.product_id, p.title AS name,
                   lp.quantity, lp.checked, lp.created_at, lp.updated_at
            FROM list_products lp
            LEFT JOIN products p ON p.id = lp.product_id AND p.deleted_at IS NULL
            WHERE lp.list_id = ANY($1) AND lp.deleted_at IS NULL
            ORDER BY lp.created_at ASC
            "#,
        )
        .bind(list_ids)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }
}
