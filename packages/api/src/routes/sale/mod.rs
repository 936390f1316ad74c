use axum::{Router, routing::get};

use crate::state::AppState;

pub mod list_sales;
pub mod sales_summary;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales::list_sales))
        .route("/summary", get(sales_summary::sales_summary))
}
