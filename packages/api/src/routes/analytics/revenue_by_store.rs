//! Revenue per store with location context.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;

#[derive(Clone, Debug, Deserialize)]
pub struct RevenueByStoreParams {
    pub brand_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct RevenueByStoreRow {
    pub store_name: String,
    pub city: String,
    pub state: String,
    pub revenue: f64,
    pub sales_count: i64,
    pub average_ticket: f64,
}

#[tracing::instrument(name = "GET /analytics/revenue-by-store", skip(state))]
pub async fn revenue_by_store(
    State(state): State<AppState>,
    Query(params): Query<RevenueByStoreParams>,
) -> Result<Json<Vec<RevenueByStoreRow>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut q = SqlBuilder::new(
        "SELECT \
         st.name AS store_name, \
         st.city, \
         st.state, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS revenue, \
         COUNT(*)::bigint AS sales_count, \
         ROUND(AVG(s.total_amount)::numeric, 2)::float8 AS average_ticket \
         FROM sales s \
         JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY st.id, st.name, st.city, st.state ORDER BY revenue DESC");
    q.push_filter(" LIMIT ", limit);

    let rows = RevenueByStoreRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
