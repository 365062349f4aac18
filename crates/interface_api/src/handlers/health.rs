//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use infra_db::DatabasePool;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check; pings the database before reporting healthy.
pub async fn health_check(
    State(pool): State<DatabasePool>,
) -> Result<Json<HealthResponse>, StatusCode> {
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
