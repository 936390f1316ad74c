//! Daily revenue and sale count over a trailing window.

use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_WINDOW_DAYS;
use crate::state::AppState;

const DEFAULT_DAYS: i32 = 30;

#[derive(Clone, Debug, Deserialize)]
pub struct RevenueByDayParams {
    pub brand_id: Option<i64>,
    pub days: Option<i32>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct RevenueByDayRow {
    pub date: NaiveDate,
    pub revenue: f64,
    pub sales_count: i64,
}

#[utoipa::path(
    get,
    path = "/analytics/revenue-by-day",
    tag = "analytics",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("days" = Option<i32>, Query, description = "Trailing window in days (default 30)"),
    ),
    responses(
        (status = 200, description = "Revenue per calendar day, ascending", body = Vec<RevenueByDayRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/revenue-by-day", skip(state))]
pub async fn revenue_by_day(
    State(state): State<AppState>,
    Query(params): Query<RevenueByDayParams>,
) -> Result<Json<Vec<RevenueByDayRow>>, ApiError> {
    let days = params.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_WINDOW_DAYS);

    let mut q = SqlBuilder::new(
        "SELECT \
         DATE(s.created_at) AS date, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS revenue, \
         COUNT(*)::bigint AS sales_count \
         FROM sales s \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    let days_placeholder = q.bind(days);
    q.push(&format!(
        " AND s.created_at >= NOW() - make_interval(days => {days_placeholder})"
    ));
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY DATE(s.created_at) ORDER BY date ASC");

    let rows = RevenueByDayRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
