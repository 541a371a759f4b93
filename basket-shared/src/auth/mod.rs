//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing
//! - [`jwt`]: HS256 session token claims, signing and validation
//! - [`session`]: login, bearer resolution against the stored token digest, logout
//! - [`middleware`]: Axum layer attaching an [`AuthContext`](middleware::AuthContext)
//! - [`authorization`]: workspace ownership/membership checks and member management
//! - [`scoping`]: checks that referenced products belong to the request's workspace

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod scoping;
pub mod session;
