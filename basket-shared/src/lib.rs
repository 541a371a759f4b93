//! # Basket Shared Library
//!
//! This crate contains the data layer and the access rules used by the
//! Basket API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and per-entity repositories
//! - `auth`: Authentication, session resolution and workspace authorization
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Basket shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
