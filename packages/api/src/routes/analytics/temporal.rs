//! Temporal rollups: weekday distribution and month-over-month growth.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::BrandScope;
use crate::routes::analytics::MAX_WINDOW_MONTHS;
use crate::state::AppState;

const DEFAULT_MONTHS: i32 = 6;

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct WeekdayRow {
    pub dia_semana: String,
    pub dia_numero: i32,
    pub vendas: i64,
    pub receita: f64,
}

#[utoipa::path(
    get,
    path = "/analytics/temporal/weekly",
    tag = "analytics",
    params(("brand_id" = Option<i64>, Query, description = "Restrict to one brand")),
    responses(
        (status = 200, description = "Sales per weekday, Sunday first", body = Vec<WeekdayRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/temporal/weekly", skip(state))]
pub async fn weekly_distribution(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<Vec<WeekdayRow>>, ApiError> {
    let mut q = SqlBuilder::new(
        "SELECT \
         TO_CHAR(s.created_at, 'Dy') AS dia_semana, \
         EXTRACT(DOW FROM s.created_at)::int AS dia_numero, \
         COUNT(*)::bigint AS vendas, \
         ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS receita \
         FROM sales s \
         LEFT JOIN stores st ON st.id = s.store_id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY 1, 2 ORDER BY dia_numero");

    let rows = WeekdayRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}

#[derive(Clone, Debug, Deserialize)]
pub struct MonthlyGrowthParams {
    pub brand_id: Option<i64>,
    pub months: Option<i32>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct MonthlyGrowthRow {
    /// Calendar month as `YYYY-MM`.
    pub mes: String,
    pub receita: f64,
    /// Null for the first month of the window and when the previous month
    /// had zero revenue.
    pub crescimento_mes_a_mes: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/analytics/temporal/monthly-growth",
    tag = "analytics",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("months" = Option<i32>, Query, description = "Trailing window in months (default 6)"),
    ),
    responses(
        (status = 200, description = "Monthly revenue and month-over-month growth", body = Vec<MonthlyGrowthRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/temporal/monthly-growth", skip(state))]
pub async fn monthly_growth(
    State(state): State<AppState>,
    Query(params): Query<MonthlyGrowthParams>,
) -> Result<Json<Vec<MonthlyGrowthRow>>, ApiError> {
    let months = params
        .months
        .unwrap_or(DEFAULT_MONTHS)
        .clamp(1, MAX_WINDOW_MONTHS);

    let mut q = SqlBuilder::new(
        "WITH monthly AS ( \
           SELECT DATE_TRUNC('month', s.created_at) AS mes, \
             SUM(s.total_amount)::float8 AS receita \
           FROM sales s \
           LEFT JOIN stores st ON st.id = s.store_id \
           WHERE s.sale_status_desc = 'COMPLETED'",
    );
    let months_placeholder = q.bind(months);
    q.push(&format!(
        " AND s.created_at >= NOW() - make_interval(months => {months_placeholder})"
    ));
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        " GROUP BY 1 \
         ), ordered AS ( \
           SELECT mes, receita, \
             LAG(receita) OVER (ORDER BY mes) AS receita_anterior \
           FROM monthly \
         ) \
         SELECT to_char(mes, 'YYYY-MM') AS mes, \
           ROUND(receita::numeric, 2)::float8 AS receita, \
           CASE WHEN receita_anterior IS NULL OR receita_anterior = 0 THEN NULL \
                ELSE ROUND((((receita - receita_anterior) / receita_anterior) * 100.0)::numeric, 2)::float8 \
           END AS crescimento_mes_a_mes \
         FROM ordered \
         ORDER BY mes",
    );

    let rows = MonthlyGrowthRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}
