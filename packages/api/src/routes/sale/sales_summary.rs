use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::state::AppState;

#[derive(Clone, Debug, Deserialize)]
pub struct SalesSummaryParams {
    pub brand_id: Option<i64>,
    /// Inclusive lower bound, any timestamp accepted by the data store.
    pub start_date: Option<String>,
    /// Inclusive upper bound.
    pub end_date: Option<String>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue: Option<f64>,
    pub average_ticket: Option<f64>,
    pub total_discounts: Option<f64>,
    pub total_delivery_fees: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/sales/summary",
    tag = "sales",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("start_date" = Option<String>, Query, description = "Inclusive lower bound"),
        ("end_date" = Option<String>, Query, description = "Inclusive upper bound"),
    ),
    responses(
        (status = 200, description = "Aggregate over completed sales", body = SalesSummary)
    )
)]
#[tracing::instrument(name = "GET /sales/summary", skip(state))]
pub async fn sales_summary(
    State(state): State<AppState>,
    Query(params): Query<SalesSummaryParams>,
) -> Result<Json<SalesSummary>, ApiError> {
    let mut q = SqlBuilder::new(
        "SELECT \
         COUNT(*)::bigint AS total_sales, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS total_revenue, \
         ROUND(AVG(s.total_amount)::numeric, 2)::float8 AS average_ticket, \
         ROUND(SUM(s.total_discount)::numeric, 2)::float8 AS total_discounts, \
         ROUND(SUM(s.delivery_fee)::numeric, 2)::float8 AS total_delivery_fees \
         FROM sales s \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );

    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    if let Some(start_date) = &params.start_date {
        let placeholder = q.bind(start_date.as_str());
        q.push(&format!(" AND s.created_at >= {placeholder}::timestamptz"));
    }
    if let Some(end_date) = &params.end_date {
        let placeholder = q.bind(end_date.as_str());
        q.push(&format!(" AND s.created_at <= {placeholder}::timestamptz"));
    }

    let summary = SalesSummary::find_by_statement(q.into_statement())
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::internal("summary aggregate returned no row"))?;

    Ok(Json(summary))
}
