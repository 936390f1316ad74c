//! Per-product margin estimate. The dataset carries no cost column, so cost
//! is modeled as a fixed share of the average sale price.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::query::SqlBuilder;
use crate::routes::analytics::MAX_LIMIT;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
/// Estimated cost share of the sale price.
const COST_RATIO: &str = "0.6";

#[derive(Clone, Debug, Deserialize)]
pub struct ProductMarginsParams {
    pub brand_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct ProductMarginRow {
    pub produto: String,
    pub preco_medio: f64,
    pub custo_estimado: f64,
    pub margem_unitaria: f64,
    pub margem_percentual: Option<f64>,
    pub total_vendido: i64,
    pub vendas_com_produto: i64,
    pub receita_total: f64,
    pub lucro_total: f64,
}

#[tracing::instrument(name = "GET /analytics/product-margins", skip(state, uri))]
pub async fn product_margins(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ProductMarginsParams>,
) -> Result<Json<Vec<ProductMarginRow>>, ApiError> {
    let cache_key = uri.to_string();
    if let Some(cached) = state.get_cache::<Vec<ProductMarginRow>>(&cache_key) {
        return Ok(Json(cached));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut q = SqlBuilder::new(format!(
        "WITH product_stats AS ( \
           SELECT \
             p.id, \
             p.name AS produto, \
             AVG(ps.total_price) AS preco_medio, \
             AVG(ps.total_price) * {COST_RATIO} AS custo_estimado, \
             SUM(ps.quantity) AS total_vendido, \
             COUNT(DISTINCT ps.sale_id) AS vendas_com_produto, \
             SUM(ps.total_price) AS receita_total \
           FROM products p \
           JOIN product_sales ps ON ps.product_id = p.id \
           JOIN sales s ON ps.sale_id = s.id \
           LEFT JOIN stores st ON s.store_id = st.id \
           WHERE s.sale_status_desc = 'COMPLETED'"
    ));
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        " GROUP BY p.id, p.name \
         ) \
         SELECT \
           produto, \
           ROUND(preco_medio::numeric, 2)::float8 AS preco_medio, \
           ROUND(custo_estimado::numeric, 2)::float8 AS custo_estimado, \
           ROUND((preco_medio - custo_estimado)::numeric, 2)::float8 AS margem_unitaria, \
           ROUND(((preco_medio - custo_estimado) / NULLIF(preco_medio, 0) * 100)::numeric, 2)::float8 AS margem_percentual, \
           total_vendido::bigint AS total_vendido, \
           vendas_com_produto::bigint AS vendas_com_produto, \
           ROUND(receita_total::numeric, 2)::float8 AS receita_total, \
           ROUND((receita_total - (custo_estimado * total_vendido))::numeric, 2)::float8 AS lucro_total \
         FROM product_stats \
         ORDER BY margem_percentual ASC",
    );
    q.push_filter(" LIMIT ", limit);

    let rows = ProductMarginRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    state.set_cache(cache_key, &rows);

    Ok(Json(rows))
}
