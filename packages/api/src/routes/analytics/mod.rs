use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod anomalies;
pub mod custom;
pub mod customer_retention;
pub mod delivery_performance;
pub mod hourly_distribution;
pub mod overview;
pub mod product_margins;
pub mod revenue_by_channel;
pub mod revenue_by_day;
pub mod revenue_by_store;
pub mod temporal;
pub mod top_products;
pub mod top_products_by_weekday;

/// Upper bound on caller-supplied trailing windows. Values are bound through
/// `make_interval`, the clamp just keeps the scanned range sane.
pub(crate) const MAX_WINDOW_DAYS: i32 = 3_650;
pub(crate) const MAX_WINDOW_MONTHS: i32 = 120;
/// Upper bound on caller-supplied row limits.
pub(crate) const MAX_LIMIT: i64 = 1_000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/revenue-by-day", get(revenue_by_day::revenue_by_day))
        .route("/top-products", get(top_products::top_products))
        .route(
            "/revenue-by-channel",
            get(revenue_by_channel::revenue_by_channel),
        )
        .route("/revenue-by-store", get(revenue_by_store::revenue_by_store))
        .route(
            "/hourly-distribution",
            get(hourly_distribution::hourly_distribution),
        )
        .route("/overview", get(overview::overview))
        .route(
            "/channel-distribution",
            get(overview::channel_distribution),
        )
        .route("/product-stats", get(overview::product_stats))
        .route("/customer-stats", get(overview::customer_stats))
        .route("/temporal/weekly", get(temporal::weekly_distribution))
        .route("/temporal/monthly-growth", get(temporal::monthly_growth))
        .route("/product-margins", get(product_margins::product_margins))
        .route(
            "/delivery-performance",
            get(delivery_performance::delivery_performance),
        )
        .route(
            "/customer-retention",
            get(customer_retention::customer_retention),
        )
        .route("/anomalies", get(anomalies::anomalies))
        .route(
            "/top-products-by-weekday",
            get(top_products_by_weekday::top_products_by_weekday),
        )
        .route("/custom", post(custom::custom_analytics))
}
