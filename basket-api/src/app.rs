//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use basket_api::{app::{build_router, AppState}, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let app = build_router(AppState::new(pool, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3333").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use basket_shared::auth::middleware::create_session_middleware;
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                          public
/// /users/register, /users/login                    public
/// /users/logout                                    bearer
/// /workspaces[/:workspace_id[/...]]                bearer
/// ```
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users/register", post(routes::auth::register))
        .route("/users/login", post(routes::auth::login));

    let workspace_routes = Router::new()
        .route(
            "/",
            post(routes::workspaces::create_workspace).get(routes::workspaces::list_workspaces),
        )
        .route(
            "/:workspace_id",
            get(routes::workspaces::get_workspace)
                .patch(routes::workspaces::update_workspace)
                .delete(routes::workspaces::delete_workspace),
        )
        .route(
            "/:workspace_id/add_user/:user_id",
            post(routes::workspaces::add_user),
        )
        .route(
            "/:workspace_id/remove_user/:user_id",
            delete(routes::workspaces::remove_user),
        )
        .route("/:workspace_id/users", get(routes::workspaces::list_users))
        .route(
            "/:workspace_id/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/:workspace_id/products/:product_id",
            patch(routes::products::update_product).delete(routes::products::delete_product),
        )
        .route(
            "/:workspace_id/product-lists",
            get(routes::lists::list_lists).post(routes::lists::create_list),
        )
        .route(
            "/:workspace_id/product-lists/:list_id",
            get(routes::lists::get_list).patch(routes::lists::update_list),
        )
        .route(
            "/:workspace_id/product-lists/:list_id/status",
            patch(routes::lists::update_list_status),
        )
        .route(
            "/:workspace_id/product-lists/:list_id/products/:product_id",
            patch(routes::lists::update_list_item).delete(routes::lists::remove_list_item),
        );

    let protected_routes = Router::new()
        .route("/users/logout", post(routes::auth::logout))
        .nest("/workspaces", workspace_routes)
        .route_layer(middleware::from_fn(create_session_middleware(
            state.db.clone(),
            state.jwt_secret().to_string(),
        )));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
