use std::sync::Arc;

use axum::{Json, Router, http::StatusCode};
use serde_json::json;
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
};

pub mod entity;
mod routes;

pub mod error;
pub mod query;
pub mod state;

pub use axum;
pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/brands", routes::brand::routes())
        .nest("/sales", routes::sale::routes())
        .nest("/analytics", routes::analytics::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new()
        .nest("/api", router)
        .fallback(route_not_found)
}

async fn route_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
