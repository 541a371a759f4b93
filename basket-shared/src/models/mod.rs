//! Database models for Basket
//!
//! Each model owns the SQL for its table. Every read that feeds a response
//! filters `deleted_at IS NULL`; deletion only ever stamps `deleted_at`.
//!
//! # Models
//!
//! - `user`: Accounts and the current session token digest (credential store)
//! - `workspace`: Tenant boundary, owned by one user
//! - `membership`: Non-owner access grants to a workspace
//! - `product`: Per-workspace catalog entries
//! - `list`: Shopping lists and their status state machine
//! - `list_product`: List items and list reconciliation

pub mod list;
pub mod list_product;
pub mod membership;
pub mod product;
pub mod user;
pub mod workspace;

pub use list::{ListStatus, ListWithItems, ProductList};
pub use list_product::{ListItemTarget, ListItemView, ListProduct};
pub use membership::{WorkspaceMember, WorkspaceRole, WorkspaceUser};
pub use product::Product;
pub use user::User;
pub use workspace::Workspace;
