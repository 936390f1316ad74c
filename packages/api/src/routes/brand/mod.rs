use axum::{Router, routing::get};

use crate::state::AppState;

pub mod get_brands;
pub mod get_channels;
pub mod get_stores;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_brands::get_brands))
        .route("/{brand_id}/stores", get(get_stores::get_stores))
        .route("/{brand_id}/channels", get(get_channels::get_channels))
}
