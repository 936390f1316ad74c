//! Caller-composed aggregation: a closed set of metrics and dimensions is
//! assembled into one SELECT at request time.
//!
//! A dimension always contributes its SELECT and GROUP BY expressions as a
//! pair; metrics contribute aggregates only. Result ordering is revenue
//! desc when requested, sales desc otherwise; callers wanting deterministic
//! order request one of the two.

use axum::Json;
use axum::extract::State;
use sea_orm::{FromQueryResult, JsonValue};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::query::{SqlBuilder, redact_placeholders};
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sales,
    Revenue,
    AverageTicket,
}

impl Metric {
    fn select_expr(self) -> &'static str {
        match self {
            Self::Sales => "COUNT(s.id)::bigint AS sales",
            Self::Revenue => "ROUND(SUM(s.total_amount)::numeric, 2)::float8 AS revenue",
            Self::AverageTicket => {
                "ROUND(AVG(s.total_amount)::numeric, 2)::float8 AS average_ticket"
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Channel,
    Store,
    Date,
}

impl Dimension {
    fn select_expr(self) -> &'static str {
        match self {
            Self::Channel => "c.name AS channel",
            Self::Store => "st.name AS store",
            Self::Date => "DATE(s.created_at)::text AS date",
        }
    }

    fn group_expr(self) -> &'static str {
        match self {
            Self::Channel => "c.id, c.name",
            Self::Store => "st.id, st.name",
            Self::Date => "DATE(s.created_at)",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CustomFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CustomQueryRequest {
    pub metrics: Vec<Metric>,
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub filters: CustomFilters,
    /// Mandatory here, unlike the catalog endpoints.
    pub brand_id: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct CustomQueryResponse {
    pub data: Vec<JsonValue>,
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    /// Executed statement with placeholders redacted, for diagnostic
    /// display. Bound values never appear here.
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("metrics must not be empty")]
    EmptyMetrics,
    #[error("dimensions must not be empty")]
    EmptyDimensions,
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

fn dedup<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(item) {
            seen.push(*item);
        }
    }
    seen
}

pub(crate) fn build_custom_query(request: &CustomQueryRequest) -> Result<SqlBuilder, BuildError> {
    if request.metrics.is_empty() {
        return Err(BuildError::EmptyMetrics);
    }
    if request.dimensions.is_empty() {
        return Err(BuildError::EmptyDimensions);
    }

    let metrics = dedup(&request.metrics);
    let dimensions = dedup(&request.dimensions);

    let mut select_parts: Vec<&str> = Vec::new();
    let mut group_parts: Vec<&str> = Vec::new();
    for dimension in &dimensions {
        select_parts.push(dimension.select_expr());
        group_parts.push(dimension.group_expr());
    }
    for metric in &metrics {
        select_parts.push(metric.select_expr());
    }

    let mut q = SqlBuilder::new(format!(
        "SELECT {} \
         FROM sales s \
         LEFT JOIN channels c ON s.channel_id = c.id \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
        select_parts.join(", ")
    ));
    q.push_filter(" AND st.brand_id = ", request.brand_id);
    if let Some(start_date) = &request.filters.start_date {
        let placeholder = q.bind(start_date.as_str());
        q.push(&format!(" AND s.created_at >= {placeholder}::timestamptz"));
    }
    if let Some(end_date) = &request.filters.end_date {
        let placeholder = q.bind(end_date.as_str());
        q.push(&format!(" AND s.created_at <= {placeholder}::timestamptz"));
    }

    q.push(&format!(" GROUP BY {}", group_parts.join(", ")));

    if metrics.contains(&Metric::Revenue) {
        q.push(" ORDER BY revenue DESC");
    } else if metrics.contains(&Metric::Sales) {
        q.push(" ORDER BY sales DESC");
    }

    q.push_filter(" LIMIT ", request.limit.clamp(1, MAX_LIMIT));

    Ok(q)
}

#[tracing::instrument(name = "POST /analytics/custom", skip(state, request))]
pub async fn custom_analytics(
    State(state): State<AppState>,
    Json(request): Json<CustomQueryRequest>,
) -> Result<Json<CustomQueryResponse>, ApiError> {
    let q = build_custom_query(&request)?;
    let query = redact_placeholders(q.sql());

    let data = JsonValue::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(CustomQueryResponse {
        data,
        dimensions: request.dimensions,
        metrics: request.metrics,
        query,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(metrics: Vec<Metric>, dimensions: Vec<Dimension>) -> CustomQueryRequest {
        CustomQueryRequest {
            metrics,
            dimensions,
            filters: CustomFilters::default(),
            brand_id: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    #[test]
    fn empty_metrics_fail_before_any_sql_is_built() {
        let err = build_custom_query(&request(vec![], vec![Dimension::Date])).unwrap_err();
        assert!(matches!(err, BuildError::EmptyMetrics));
    }

    #[test]
    fn empty_dimensions_fail_before_any_sql_is_built() {
        let err = build_custom_query(&request(vec![Metric::Sales], vec![])).unwrap_err();
        assert!(matches!(err, BuildError::EmptyDimensions));
    }

    #[test]
    fn dimensions_pair_select_with_group_by() {
        let q = build_custom_query(&request(
            vec![Metric::Sales],
            vec![Dimension::Channel, Dimension::Date],
        ))
        .unwrap();
        let sql = q.sql();
        assert!(sql.contains("c.name AS channel"));
        assert!(sql.contains("DATE(s.created_at)::text AS date"));
        assert!(sql.contains("GROUP BY c.id, c.name, DATE(s.created_at)"));
    }

    #[test]
    fn metrics_never_reach_the_group_by() {
        let q = build_custom_query(&request(
            vec![Metric::Sales, Metric::Revenue],
            vec![Dimension::Store],
        ))
        .unwrap();
        let group_by = q.sql().rsplit("GROUP BY ").next().unwrap();
        assert!(!group_by.contains("sales"));
        assert!(!group_by.contains("revenue DESC GROUP"));
        assert!(q.sql().contains("GROUP BY st.id, st.name"));
    }

    #[test]
    fn revenue_ordering_wins_over_sales() {
        let q = build_custom_query(&request(
            vec![Metric::Sales, Metric::Revenue],
            vec![Dimension::Date],
        ))
        .unwrap();
        assert!(q.sql().contains("ORDER BY revenue DESC"));

        let q = build_custom_query(&request(vec![Metric::Sales], vec![Dimension::Date])).unwrap();
        assert!(q.sql().contains("ORDER BY sales DESC"));
    }

    #[test]
    fn ordering_is_omitted_without_a_rankable_metric() {
        let q = build_custom_query(&request(vec![Metric::AverageTicket], vec![Dimension::Date]))
            .unwrap();
        assert!(!q.sql().contains("ORDER BY"));
    }

    #[test]
    fn filters_consume_slots_in_declaration_order() {
        let mut req = request(vec![Metric::Revenue], vec![Dimension::Date]);
        req.filters.start_date = Some("2026-01-01".to_string());
        req.filters.end_date = Some("2026-02-01".to_string());
        let q = build_custom_query(&req).unwrap();
        // brand, start, end, limit
        assert_eq!(q.values().len(), 4);
        assert!(q.sql().contains("st.brand_id = $1"));
        assert!(q.sql().contains("s.created_at >= $2"));
        assert!(q.sql().contains("s.created_at <= $3"));
        assert!(q.sql().ends_with(" LIMIT $4"));
    }

    #[test]
    fn duplicate_selections_collapse() {
        let q = build_custom_query(&request(
            vec![Metric::Sales, Metric::Sales],
            vec![Dimension::Date, Dimension::Date],
        ))
        .unwrap();
        assert_eq!(q.sql().matches("AS sales").count(), 1);
        assert_eq!(q.sql().matches("AS date").count(), 1);
    }

    #[test]
    fn diagnostic_rendering_never_contains_placeholders() {
        let mut req = request(vec![Metric::Revenue], vec![Dimension::Store]);
        req.filters.start_date = Some("2026-01-01".to_string());
        let q = build_custom_query(&req).unwrap();
        let rendered = redact_placeholders(q.sql());
        assert!(!rendered.contains('$'));
        assert!(!rendered.contains("2026-01-01"));
    }
}
