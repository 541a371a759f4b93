//! Common test utilities for integration tests
//!
//! Tests need a scratch PostgreSQL database in `DATABASE_URL`. When it is
//! not set, [`TestContext::new`] returns None and the test returns early.

#![allow(dead_code)]

use std::env;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use basket_api::app::{build_router, AppState};
use basket_api::config::Config;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-key-0123456789";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test context holding the router and the pool behind it
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
}

/// A registered, logged-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestContext {
    /// Connects, migrates and builds the router; None without `DATABASE_URL`
    pub async fn new() -> Option<Self> {
        let Ok(database_url) = env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(database_url.clone()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let db = PgPool::connect(&config.database.url)
            .await
            .expect("connect to test database");

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Some(TestContext { db, app, config })
    }

    /// Sends a request and returns the status and the JSON body (Null if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, json)
    }

    /// Registers a fresh user and logs in
    pub async fn user(&self, name: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name, Uuid::new_v4());

        let (status, body) = self
            .send(
                "POST",
                "/users/register",
                None,
                Some(json!({ "email": email, "password": TEST_PASSWORD, "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let token = self.login(&email).await;

        let id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND deleted_at IS NULL")
            .bind(&email)
            .fetch_one(&self.db)
            .await
            .unwrap();

        TestUser { id, email, token }
    }

    /// Logs in with [`TEST_PASSWORD`] and returns the token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/users/login",
                None,
                Some(json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }

    pub async fn workspace(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .send("POST", "/workspaces", Some(&owner.token), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create workspace failed: {}", body);

        id_of(&body)
    }

    pub async fn product(&self, user: &TestUser, workspace_id: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .send(
                "POST",
                &format!("/workspaces/{}/products", workspace_id),
                Some(&user.token),
                Some(json!({ "title": title, "unit_type": "pcs", "price": 1.5 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {}", body);

        id_of(&body)
    }
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}

/// `(product_id, quantity)` of each item in a list response, sorted by product
pub fn items_of(list: &Value) -> Vec<(Uuid, i64)> {
    let mut items: Vec<(Uuid, i64)> = list["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["product_id"].as_str().unwrap().parse().unwrap(),
                item["quantity"].as_i64().unwrap(),
            )
        })
        .collect();
    items.sort();
    items
}
