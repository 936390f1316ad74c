//! Best-selling products across the whole history, by line-item revenue.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;

#[derive(Clone, Debug, Deserialize)]
pub struct TopProductsParams {
    pub brand_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct TopProductRow {
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
    pub sales_count: i64,
}

#[utoipa::path(
    get,
    path = "/analytics/top-products",
    tag = "analytics",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("limit" = Option<i64>, Query, description = "Row cap (default 10)"),
    ),
    responses(
        (status = 200, description = "Products by line-item revenue, descending", body = Vec<TopProductRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/top-products", skip(state))]
pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<TopProductsParams>,
) -> Result<Json<Vec<TopProductRow>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut q = SqlBuilder::new(
        "SELECT \
         p.name AS product_name, \
         SUM(ps.quantity)::bigint AS total_quantity, \
         ROUND(SUM(ps.total_price)::numeric, 2)::float8 AS total_revenue, \
         COUNT(DISTINCT ps.sale_id)::bigint AS sales_count \
         FROM product_sales ps \
         JOIN products p ON ps.product_id = p.id \
         JOIN sales s ON ps.sale_id = s.id \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY p.id, p.name ORDER BY total_revenue DESC");
    q.push_filter(" LIMIT ", limit);

    let rows = TopProductRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
