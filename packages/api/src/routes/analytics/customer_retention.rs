//! Customer retention buckets.
//!
//! A customer is `Ativo` while their last purchase is at most
//! `days_inactive` days old, `Em risco` up to twice that, `Inativo` beyond.
//! Only customers with at least `min_purchases` completed sales are listed.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use sea_orm::{FromQueryResult, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_DAYS_INACTIVE: i32 = 30;
const DEFAULT_MIN_PURCHASES: i64 = 3;
const DEFAULT_LIMIT: i64 = 10;

#[derive(Clone, Debug, Deserialize)]
pub struct CustomerRetentionParams {
    pub brand_id: Option<i64>,
    pub days_inactive: Option<i32>,
    pub min_purchases: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct CustomerRetentionRow {
    pub customer_name: String,
    pub email: Option<String>,
    pub total_compras: i64,
    pub valor_total_gasto: f64,
    pub ticket_medio: f64,
    #[schema(value_type = String, format = DateTime)]
    pub primeira_compra: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub ultima_compra: DateTimeWithTimeZone,
    pub dias_desde_ultima_compra: i32,
    pub status_retencao: String,
    pub categoria_cliente: String,
}

fn build_retention_query(
    brand_id: Option<i64>,
    days_inactive: i32,
    min_purchases: i64,
    limit: i64,
) -> SqlBuilder {
    let mut q = SqlBuilder::new(
        "WITH customer_stats AS ( \
           SELECT \
             c.id, \
             c.customer_name, \
             c.email, \
             COUNT(DISTINCT s.id)::bigint AS total_compras, \
             SUM(s.total_amount) AS valor_total_gasto, \
             AVG(s.total_amount) AS ticket_medio, \
             MIN(s.created_at) AS primeira_compra, \
             MAX(s.created_at) AS ultima_compra, \
             EXTRACT(DAYS FROM (NOW() - MAX(s.created_at)))::int AS dias_desde_ultima_compra \
           FROM customers c \
           JOIN sales s ON s.customer_id = c.id \
           LEFT JOIN stores st ON s.store_id = st.id \
           WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(" GROUP BY c.id, c.customer_name, c.email )");

    let days = q.bind(days_inactive);
    let min = q.bind(min_purchases);
    q.push(&format!(
        " SELECT \
           customer_name, \
           email, \
           total_compras, \
           ROUND(valor_total_gasto::numeric, 2)::float8 AS valor_total_gasto, \
           ROUND(ticket_medio::numeric, 2)::float8 AS ticket_medio, \
           primeira_compra, \
           ultima_compra, \
           dias_desde_ultima_compra, \
           CASE \
             WHEN dias_desde_ultima_compra <= {days} THEN 'Ativo' \
             WHEN dias_desde_ultima_compra <= {days} * 2 THEN 'Em risco' \
             ELSE 'Inativo' \
           END AS status_retencao, \
           CASE \
             WHEN total_compras >= {min} AND dias_desde_ultima_compra > {days} THEN 'Alerta: Cliente valioso inativo' \
             WHEN total_compras >= {min} AND dias_desde_ultima_compra <= {days} THEN 'Cliente valioso ativo' \
             ELSE 'Cliente regular' \
           END AS categoria_cliente \
         FROM customer_stats \
         WHERE total_compras >= {min} \
         ORDER BY total_compras DESC, valor_total_gasto DESC"
    ));
    q.push_filter(" LIMIT ", limit);
    q
}

#[utoipa::path(
    get,
    path = "/analytics/customer-retention",
    tag = "analytics",
    params(
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("days_inactive" = Option<i32>, Query, description = "Activity threshold in days (default 30)"),
        ("min_purchases" = Option<i64>, Query, description = "Minimum completed sales (default 3)"),
        ("limit" = Option<i64>, Query, description = "Row cap (default 10)"),
    ),
    responses(
        (status = 200, description = "Repeat customers with retention buckets", body = Vec<CustomerRetentionRow>)
    )
)]
#[tracing::instrument(name = "GET /analytics/customer-retention", skip(state, uri))]
pub async fn customer_retention(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<CustomerRetentionParams>,
) -> Result<Json<Vec<CustomerRetentionRow>>, ApiError> {
    let cache_key = uri.to_string();
    if let Some(cached) = state.get_cache::<Vec<CustomerRetentionRow>>(&cache_key) {
        return Ok(Json(cached));
    }

    let days_inactive = params
        .days_inactive
        .unwrap_or(DEFAULT_DAYS_INACTIVE)
        .max(1);
    let min_purchases = params.min_purchases.unwrap_or(DEFAULT_MIN_PURCHASES).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let q = build_retention_query(params.brand_id, days_inactive, min_purchases, limit);
    let rows = CustomerRetentionRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    state.set_cache(cache_key, &rows);

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_bound_not_spliced() {
        let q = build_retention_query(None, 30, 3, 10);
        // days_inactive, min_purchases, limit
        assert_eq!(q.values().len(), 3);
        assert!(!q.sql().contains("<= 30"));
        assert!(q.sql().contains("<= $1"));
        assert!(q.sql().contains(">= $2"));
        assert!(q.sql().ends_with(" LIMIT $3"));
    }

    #[test]
    fn at_risk_band_is_twice_the_active_threshold() {
        let q = build_retention_query(None, 30, 3, 10);
        assert!(q.sql().contains("<= $1 THEN 'Ativo'"));
        assert!(q.sql().contains("<= $1 * 2 THEN 'Em risco'"));
        assert!(q.sql().contains("ELSE 'Inativo'"));
    }

    #[test]
    fn brand_filter_shifts_every_following_placeholder() {
        let q = build_retention_query(Some(7), 30, 3, 10);
        assert_eq!(q.values().len(), 4);
        assert!(q.sql().contains("st.brand_id = $1"));
        assert!(q.sql().contains("<= $2 THEN 'Ativo'"));
        assert!(q.sql().ends_with(" LIMIT $4"));
    }
}
