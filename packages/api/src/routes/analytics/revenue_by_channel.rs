//! Revenue per sales channel.
//!
//! Channels are grouped by name: the same delivery app appears once even
//! when several brands run it, which is what the unfiltered view wants.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 5;

#[derive(Clone, Debug, Deserialize)]
pub struct RevenueByChannelParams {
    pub brand_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct RevenueByChannelRow {
    pub channel_name: String,
    pub revenue: f64,
    pub sales_count: i64,
    pub average_ticket: f64,
}

#[tracing::instrument(name = "GET /analytics/revenue-by-channel", skip(state))]
pub async fn revenue_by_channel(
    State(state): State<AppState>,
    Query(params): Query<RevenueByChannelParams>,
) -> Result<Json<Vec<RevenueByChannelRow>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut q = SqlBuilder::new(
        "SELECT \
         ch.name AS channel_name, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS revenue, \
         COUNT(*)::bigint AS sales_count, \
         ROUND(AVG(s.total_amount)::numeric, 2)::float8 AS average_ticket \
         FROM sales s \
         JOIN channels ch ON s.channel_id = ch.id \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY ch.name ORDER BY revenue DESC");
    q.push_filter(" LIMIT ", limit);

    let rows = RevenueByChannelRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
