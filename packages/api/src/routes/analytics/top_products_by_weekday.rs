//! Top products per weekday.
//!
//! Two-phase pipeline: one flat query ordered by (weekday, revenue desc),
//! then an in-memory fold that buckets rows by weekday label and caps each
//! bucket at the requested limit. A per-group SQL window would do the same
//! in one statement; the flat-then-fold shape is the documented interface.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use sea_orm::FromQueryResult;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 5;

#[derive(Clone, Debug, Deserialize)]
pub struct TopProductsByWeekdayParams {
    pub brand_id: Option<i64>,
    pub limit: Option<i64>,
}

// dia_numero is selected for ordering only and stays in the SQL result.
#[derive(Debug, FromQueryResult)]
struct WeekdayProductRow {
    dia_semana: String,
    product_name: String,
    total_quantity: i64,
    total_revenue: f64,
    sales_count: i64,
}

/// Rows arrive ordered by (dia_numero, total_revenue desc); insertion order
/// of the map keys and of each bucket follows from that.
fn fold_by_weekday(rows: Vec<WeekdayProductRow>, limit: usize) -> Map<String, Value> {
    let mut grouped = Map::new();
    for row in rows {
        let bucket = grouped
            .entry(row.dia_semana)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(products) = bucket {
            if products.len() < limit {
                products.push(json!({
                    "product_name": row.product_name,
                    "total_quantity": row.total_quantity,
                    "total_revenue": row.total_revenue,
                    "sales_count": row.sales_count,
                }));
            }
        }
    }
    grouped
}

#[tracing::instrument(name = "GET /analytics/top-products-by-weekday", skip(state, uri))]
pub async fn top_products_by_weekday(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<TopProductsByWeekdayParams>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let cache_key = uri.to_string();
    if let Some(cached) = state.get_cache::<Map<String, Value>>(&cache_key) {
        return Ok(Json(cached));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;

    let mut q = SqlBuilder::new(
        "SELECT \
         TO_CHAR(s.created_at, 'Dy') AS dia_semana, \
         EXTRACT(DOW FROM s.created_at)::int AS dia_numero, \
         p.name AS product_name, \
         SUM(ps.quantity)::bigint AS total_quantity, \
         ROUND(SUM(ps.total_price)::numeric, 2)::float8 AS total_revenue, \
         COUNT(DISTINCT ps.sale_id)::bigint AS sales_count \
         FROM product_sales ps \
         JOIN products p ON ps.product_id = p.id \
         JOIN sales s ON ps.sale_id = s.id \
         LEFT JOIN stores st ON s.store_id = st.id \
         WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        " GROUP BY TO_CHAR(s.created_at, 'Dy'), EXTRACT(DOW FROM s.created_at), p.id, p.name \
         ORDER BY dia_numero, total_revenue DESC",
    );

    let rows = WeekdayProductRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    let grouped = fold_by_weekday(rows, limit);
    state.set_cache(cache_key, &grouped);

    Ok(Json(grouped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dia_semana: &str, product_name: &str, total_revenue: f64) -> WeekdayProductRow {
        WeekdayProductRow {
            dia_semana: dia_semana.to_string(),
            product_name: product_name.to_string(),
            total_quantity: 1,
            total_revenue,
            sales_count: 1,
        }
    }

    #[test]
    fn buckets_are_capped_at_the_limit() {
        let rows = vec![row("Mon", "P1", 100.0), row("Mon", "P2", 50.0)];
        let grouped = fold_by_weekday(rows, 1);

        let monday = grouped.get("Mon").and_then(Value::as_array).unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0]["product_name"], "P1");
    }

    #[test]
    fn weekday_order_is_preserved() {
        let rows = vec![
            row("Sun", "P1", 10.0),
            row("Mon", "P2", 20.0),
            row("Tue", "P3", 30.0),
        ];
        let grouped = fold_by_weekday(rows, 5);
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, ["Sun", "Mon", "Tue"]);
    }

    #[test]
    fn bucket_rows_drop_the_weekday_columns() {
        let grouped = fold_by_weekday(vec![row("Wed", "P1", 10.0)], 5);
        let product = &grouped.get("Wed").and_then(Value::as_array).unwrap()[0];
        assert!(product.get("dia_semana").is_none());
        assert!(product.get("dia_numero").is_none());
        assert_eq!(product["total_revenue"], 10.0);
    }
}
