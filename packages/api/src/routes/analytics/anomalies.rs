//! Daily sales anomalies against a 7-day rolling window.
//!
//! The window is the current day plus the six preceding rows, so the first
//! days of the series use however many samples exist. A day is flagged when
//! its count or revenue sits more than two rolling standard deviations from
//! the rolling mean, in either direction.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
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
pub struct AnomaliesParams {
    pub brand_id: Option<i64>,
    pub days: Option<i32>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct AnomalyRow {
    pub data: NaiveDate,
    pub vendas: i64,
    pub receita: f64,
    pub ticket_medio: f64,
    pub media_vendas_7d: f64,
    pub media_receita_7d: f64,
    pub anomalia: String,
    pub variacao_vendas_pct: Option<f64>,
    pub variacao_receita_pct: Option<f64>,
}

fn build_anomaly_query(brand_id: Option<i64>, days: i32) -> SqlBuilder {
    let mut q = SqlBuilder::new(
        "WITH daily_stats AS ( \
           SELECT \
             DATE(s.created_at) AS data, \
             COUNT(*)::bigint AS vendas, \
             SUM(s.total_amount) AS receita, \
             AVG(s.total_amount) AS ticket_medio \
           FROM sales s \
           LEFT JOIN stores st ON s.store_id = st.id \
           WHERE s.sale_status_desc = 'COMPLETED'",
    );
    let days_placeholder = q.bind(days);
    q.push(&format!(
        " AND s.created_at >= NOW() - make_interval(days => {days_placeholder})"
    ));
    if let Some(brand_id) = brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        " GROUP BY DATE(s.created_at) \
         ), \
         stats_with_avg AS ( \
           SELECT *, \
             AVG(vendas) OVER w AS media_vendas_7d, \
             AVG(receita) OVER w AS media_receita_7d, \
             STDDEV(vendas) OVER w AS desvio_vendas_7d, \
             STDDEV(receita) OVER w AS desvio_receita_7d \
           FROM daily_stats \
           WINDOW w AS (ORDER BY data ROWS BETWEEN 6 PRECEDING AND CURRENT ROW) \
         ) \
         SELECT \
           data, \
           vendas, \
           ROUND(receita::numeric, 2)::float8 AS receita, \
           ROUND(ticket_medio::numeric, 2)::float8 AS ticket_medio, \
           ROUND(media_vendas_7d::numeric, 2)::float8 AS media_vendas_7d, \
           ROUND(media_receita_7d::numeric, 2)::float8 AS media_receita_7d, \
           CASE \
             WHEN vendas < (media_vendas_7d - 2 * desvio_vendas_7d) THEN 'Queda significativa em vendas' \
             WHEN vendas > (media_vendas_7d + 2 * desvio_vendas_7d) THEN 'Pico significativo em vendas' \
             WHEN receita < (media_receita_7d - 2 * desvio_receita_7d) THEN 'Queda significativa em receita' \
             WHEN receita > (media_receita_7d + 2 * desvio_receita_7d) THEN 'Pico significativo em receita' \
             ELSE 'Normal' \
           END AS anomalia, \
           ROUND(((vendas - media_vendas_7d) / NULLIF(media_vendas_7d, 0) * 100)::numeric, 2)::float8 AS variacao_vendas_pct, \
           ROUND(((receita - media_receita_7d) / NULLIF(media_receita_7d, 0) * 100)::numeric, 2)::float8 AS variacao_receita_pct \
         FROM stats_with_avg \
         WHERE vendas < (media_vendas_7d - 2 * desvio_vendas_7d) \
            OR vendas > (media_vendas_7d + 2 * desvio_vendas_7d) \
            OR receita < (media_receita_7d - 2 * desvio_receita_7d) \
            OR receita > (media_receita_7d + 2 * desvio_receita_7d) \
         ORDER BY data DESC",
    );
    q
}

#[utoipa::path(
    get,
    path = "/analytics/anomalies",
    tag = "analytics",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("days" = Option<i32>, Query, description = "Trailing window in days (default 30)"),
    ),
    responses(
        (status = 200, description = "Flagged days only, most recent first", body = Vec<AnomalyRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/anomalies", skip(state, uri))]
pub async fn anomalies(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<AnomaliesParams>,
) -> Result<Json<Vec<AnomalyRow>>, ApiError> {
    let cache_key = uri.to_string();
    if let Some(cached) = state.get_cache::<Vec<AnomalyRow>>(&cache_key) {
        return Ok(Json(cached));
    }

    let days = params.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_WINDOW_DAYS);

    let q = build_anomaly_query(params.brand_id, days);
    let rows = AnomalyRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    state.set_cache(cache_key, &rows);

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_current_row_plus_six_preceding() {
        let q = build_anomaly_query(None, 30);
        assert!(q.sql().contains("ROWS BETWEEN 6 PRECEDING AND CURRENT ROW"));
    }

    #[test]
    fn deviation_ratios_guard_against_zero_means() {
        let q = build_anomaly_query(None, 30);
        assert_eq!(q.sql().matches("NULLIF(media_vendas_7d, 0)").count(), 1);
        assert_eq!(q.sql().matches("NULLIF(media_receita_7d, 0)").count(), 1);
    }

    #[test]
    fn window_length_is_bound_as_parameter() {
        let q = build_anomaly_query(None, 45);
        assert_eq!(q.values().len(), 1);
        assert!(q.sql().contains("make_interval(days => $1)"));
        assert!(!q.sql().contains("45"));
    }

    #[test]
    fn only_flagged_days_survive_the_outer_filter() {
        let q = build_anomaly_query(Some(3), 30);
        let where_clause = q.sql().rsplit("FROM stats_with_avg").next().unwrap();
        assert_eq!(where_clause.matches("desvio_vendas_7d").count(), 2);
        assert_eq!(where_clause.matches("desvio_receita_7d").count(), 2);
        assert!(q.sql().ends_with("ORDER BY data DESC"));
    }
}
