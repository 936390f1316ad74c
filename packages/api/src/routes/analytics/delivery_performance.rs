//! Delivery-time statistics at caller-selected granularity.
//!
//! Only delivery sales participate (`delivery_seconds IS NOT NULL`). The
//! bucket column in the response is named after the granularity (`hora`,
//! `data` or `semana`), so rows are returned as raw JSON values.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::{FromQueryResult, JsonValue};
use serde::Deserialize;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_WINDOW_DAYS;
use crate::state::AppState;

const DEFAULT_DAYS: i32 = 30;
/// Deliveries at or under this many minutes count as fast.
const FAST_DELIVERY_MINUTES: i32 = 30;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryGroupBy {
    Hour,
    #[default]
    Day,
    Week,
}

impl DeliveryGroupBy {
    fn select_expr(self) -> &'static str {
        match self {
            Self::Hour => "EXTRACT(HOUR FROM s.created_at)::int AS hora",
            Self::Day => "DATE(s.created_at)::text AS data",
            Self::Week => "DATE_TRUNC('week', s.created_at)::date::text AS semana",
        }
    }

    fn group_expr(self) -> &'static str {
        match self {
            Self::Hour => "EXTRACT(HOUR FROM s.created_at)",
            Self::Day => "DATE(s.created_at)",
            Self::Week => "DATE_TRUNC('week', s.created_at)",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeliveryPerformanceParams {
    pub brand_id: Option<i64>,
    pub days: Option<i32>,
    #[serde(default)]
    pub group_by: DeliveryGroupBy,
}

#[tracing::instrument(name = "GET /analytics/delivery-performance", skip(state))]
pub async fn delivery_performance(
    State(state): State<AppState>,
    Query(params): Query<DeliveryPerformanceParams>,
) -> Result<Json<Vec<JsonValue>>, ApiError> {
    let days = params.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_WINDOW_DAYS);
    let group_by = params.group_by;

    let mut q = SqlBuilder::new(format!(
        "SELECT \
         {select_expr}, \
         COUNT(*)::bigint AS total_entregas, \
         ROUND(AVG(s.delivery_seconds / 60.0)::numeric, 2)::float8 AS tempo_medio_minutos, \
         ROUND(MIN(s.delivery_seconds / 60.0)::numeric, 2)::float8 AS tempo_minimo_minutos, \
         ROUND(MAX(s.delivery_seconds / 60.0)::numeric, 2)::float8 AS tempo_maximo_minutos, \
         ROUND(PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY s.delivery_seconds / 60.0)::numeric, 2)::float8 AS mediana_minutos, \
         ROUND(PERCENTILE_CONT(0.9) WITHIN GROUP (ORDER BY s.delivery_seconds / 60.0)::numeric, 2)::float8 AS p90_minutos, \
         COUNT(*) FILTER (WHERE s.delivery_seconds / 60.0 <= {fast})::bigint AS entregas_rapidas, \
         ROUND((COUNT(*) FILTER (WHERE s.delivery_seconds / 60.0 <= {fast})::numeric / NULLIF(COUNT(*), 0)) * 100, 2)::float8 AS percentual_rapidas \
         FROM sales s \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED' \
         AND s.delivery_seconds IS NOT NULL",
        select_expr = group_by.select_expr(),
        fast = FAST_DELIVERY_MINUTES,
    ));
    let days_placeholder = q.bind(days);
    q.push(&format!(
        " AND s.created_at >= NOW() - make_interval(days => {days_placeholder})"
    ));
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(&format!(
        " GROUP BY {group} ORDER BY {group}",
        group = group_by.group_expr()
    ));

    let rows = JsonValue::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_by_defaults_to_day() {
        assert_eq!(DeliveryGroupBy::default(), DeliveryGroupBy::Day);
    }

    #[test]
    fn granularity_is_a_closed_set() {
        // The selector never reaches the SQL text as caller input; unknown
        // values are rejected at deserialization.
        let parsed: Result<DeliveryGroupBy, _> = serde_json::from_str("\"week\"");
        assert_eq!(parsed.unwrap(), DeliveryGroupBy::Week);
        let rejected: Result<DeliveryGroupBy, _> = serde_json::from_str("\"'; DROP TABLE sales\"");
        assert!(rejected.is_err());
    }

    #[test]
    fn bucket_alias_follows_granularity() {
        assert!(DeliveryGroupBy::Hour.select_expr().ends_with("AS hora"));
        assert!(DeliveryGroupBy::Day.select_expr().ends_with("AS data"));
        assert!(DeliveryGroupBy::Week.select_expr().ends_with("AS semana"));
    }
}
