// handlers/public/healthcheck.rs - GET /api/v1/healthcheck

use axum::extract::State;
use serde_json::json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/v1/healthcheck - service status, environment and version
///
/// Reports `"degraded"` instead of failing when the database does not answer,
/// so load balancers can tell the process itself is alive.
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult {
    let database = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => "available",
            Err(e) => {
                tracing::warn!("Database health check failed: {}", e);
                "unavailable"
            }
        },
        None => "not configured",
    };

    let status = if database == "unavailable" { "degraded" } else { "available" };

    Ok(ApiResponse::envelope("status", status).with(
        "system_info",
        json!({
            "environment": state.config.environment.as_str(),
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        }),
    ))
}
