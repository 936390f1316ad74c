use axum::Json;
use axum::extract::State;
use axum::{Router, routing::get};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service status and database reachability", body = HealthResponse)
    )
)]
#[tracing::instrument(name = "GET /health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let database = match state.db.ping().await {
        Ok(()) => "Connected",
        Err(err) => {
            tracing::warn!("Database ping failed: {}", err);
            "Disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        database: database.to_string(),
    }))
}
