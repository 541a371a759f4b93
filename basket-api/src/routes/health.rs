//! Health check endpoint

use axum::{extract::State, Json};
use basket_shared::db::{migrations::get_migration_status, pool::health_check as db_health_check};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    /// Number of applied migrations, None when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<usize>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = db_health_check(&state.db).await.is_ok();

    let migrations = if connected {
        match get_migration_status(&state.db).await {
            Ok(status) => Some(status.applied_migrations),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations,
    }))
}
