//! API route handlers, organized by resource
//!
//! - `health`: Health check
//! - `auth`: Register, login, logout
//! - `workspaces`: Workspaces and their members
//! - `products`: Per-workspace product catalog
//! - `lists`: Shopping lists and their items

pub mod auth;
pub mod health;
pub mod lists;
pub mod products;
pub mod workspaces;

use std::borrow::Cow;

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed
///
/// Handlers store trimmed names and titles, so a whitespace-only value
/// would otherwise be saved as an empty string.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("Must not be blank"));
        return Err(error);
    }

    Ok(())
}
