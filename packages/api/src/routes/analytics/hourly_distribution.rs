//! Sales by hour of day over the dataset's entire history.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::BrandScope;
use crate::state::AppState;

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct HourlyRow {
    pub hour: i32,
    pub sales_count: i64,
    pub revenue: f64,
}

#[utoipa::path(
    get,
    path = "/analytics/hourly-distribution",
    tag = "analytics",
    params(("brand_id" = Option<i64>, Query, description = "Restrict to one brand")),
    responses(
        (status = 200, description = "Hour-of-day (0-23) distribution, ascending", body = Vec<HourlyRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/hourly-distribution", skip(state))]
pub async fn hourly_distribution(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<Vec<HourlyRow>>, ApiError> {
    let mut q = SqlBuilder::new(
        "SELECT \
         EXTRACT(HOUR FROM s.created_at)::int AS hour, \
         COUNT(*)::bigint AS sales_count, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS revenue \
         FROM sales s \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY EXTRACT(HOUR FROM s.created_at) ORDER BY hour ASC");

    let rows = HourlyRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
