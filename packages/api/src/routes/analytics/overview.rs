//! Dataset-wide headline figures: entity counts, channel share, line-item
//! and customer-identification rates.

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
pub struct OverviewRow {
    pub lojas: i32,
    pub vendas: i64,
    pub produtos_vendidos: i64,
    pub customizacoes: i64,
    pub clientes: i32,
}

#[utoipa::path(
    get,
    path = "/analytics/overview",
    tag = "analytics",
    params(("brand_id" = Option<i64>, Query, description = "Restrict to one brand")),
    responses(
        (status = 200, description = "Headline entity counts", body = OverviewRow)
    )
)]
#[tracing::instrument(name = "GET /analytics/overview", skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<OverviewRow>, ApiError> {
    let mut q = SqlBuilder::new("SELECT");
    match params.brand_id {
        Some(brand_id) => {
            let b = q.bind(brand_id);
            q.push(&format!(
                " (SELECT COUNT(*) FROM stores st WHERE st.brand_id = {b})::int AS lojas, \
                 (SELECT COUNT(*) FROM sales s \
                   LEFT JOIN stores st2 ON st2.id = s.store_id \
                   WHERE st2.brand_id = {b})::bigint AS vendas, \
                 (SELECT COALESCE(SUM(ps.quantity), 0) FROM product_sales ps \
                   JOIN sales s2 ON s2.id = ps.sale_id \
                   JOIN stores st3 ON st3.id = s2.store_id \
                   WHERE st3.brand_id = {b})::bigint AS produtos_vendidos, \
                 (SELECT COUNT(*) FROM item_product_sales ips \
                   JOIN product_sales ps2 ON ps2.id = ips.product_sale_id \
                   JOIN sales s3 ON s3.id = ps2.sale_id \
                   JOIN stores st4 ON st4.id = s3.store_id \
                   WHERE st4.brand_id = {b})::bigint AS customizacoes, \
                 (SELECT COUNT(*) FROM customers)::int AS clientes"
            ));
        }
        None => {
            q.push(
                " (SELECT COUNT(*) FROM stores)::int AS lojas, \
                 (SELECT COUNT(*) FROM sales)::bigint AS vendas, \
                 (SELECT COALESCE(SUM(ps.quantity), 0) FROM product_sales ps \
                   JOIN sales s2 ON s2.id = ps.sale_id)::bigint AS produtos_vendidos, \
                 (SELECT COUNT(*) FROM item_product_sales ips \
                   JOIN product_sales ps2 ON ps2.id = ips.product_sale_id \
                   JOIN sales s3 ON s3.id = ps2.sale_id)::bigint AS customizacoes, \
                 (SELECT COUNT(*) FROM customers)::int AS clientes",
            );
        }
    }

    let row = OverviewRow::find_by_statement(q.into_statement())
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::internal("overview aggregate returned no row"))?;

    Ok(Json(row))
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct ChannelShareRow {
    pub canal: String,
    pub vendas: i64,
    pub percentual: Option<f64>,
}

#[tracing::instrument(name = "GET /analytics/channel-distribution", skip(state))]
pub async fn channel_distribution(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<Vec<ChannelShareRow>>, ApiError> {
    let mut q = SqlBuilder::new(
        "WITH base AS ( \
           SELECT ch.name AS canal, COUNT(*)::bigint AS vendas \
           FROM sales s \
           JOIN channels ch ON ch.id = s.channel_id \
           LEFT JOIN stores st ON st.id = s.store_id \
           WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        " GROUP BY ch.name \
         ), total AS ( \
           SELECT SUM(vendas)::bigint AS total_vendas FROM base \
         ) \
         SELECT canal, vendas, \
           ROUND((vendas::numeric / NULLIF(t.total_vendas, 0)) * 100.0, 2)::float8 AS percentual \
         FROM base b \
         JOIN total t ON true \
         ORDER BY vendas DESC \
         LIMIT 5",
    );

    let rows = ChannelShareRow::find_by_statement(q.into_statement())
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct ProductStats {
    pub media_produtos_por_venda: Option<f64>,
    pub percentual_vendas_com_customizacoes: Option<f64>,
}

#[tracing::instrument(name = "GET /analytics/product-stats", skip(state))]
pub async fn product_stats(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<ProductStats>, ApiError> {
    let mut q = SqlBuilder::new(
        "WITH sales_base AS ( \
           SELECT s.id \
           FROM sales s",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" JOIN stores st ON st.id = s.store_id AND st.brand_id = ", brand_id);
    }
    q.push(
        " WHERE s.sale_status_desc = 'COMPLETED' \
         ), \
         prod AS ( \
           SELECT SUM(ps.quantity)::numeric AS total_produtos \
           FROM product_sales ps \
           JOIN sales_base sb ON sb.id = ps.sale_id \
         ), \
         cust AS ( \
           SELECT COUNT(DISTINCT ps.sale_id)::numeric AS vendas_com_customizacoes \
           FROM product_sales ps \
           JOIN item_product_sales ips ON ips.product_sale_id = ps.id \
           JOIN sales_base sb ON sb.id = ps.sale_id \
         ), \
         totals AS ( \
           SELECT COUNT(*)::numeric AS total_vendas FROM sales_base \
         ) \
         SELECT \
           ROUND((prod.total_produtos / NULLIF(totals.total_vendas, 0))::numeric, 2)::float8 AS media_produtos_por_venda, \
           ROUND((cust.vendas_com_customizacoes / NULLIF(totals.total_vendas, 0)) * 100.0, 2)::float8 AS percentual_vendas_com_customizacoes \
         FROM prod, cust, totals",
    );

    let stats = ProductStats::find_by_statement(q.into_statement())
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::internal("product stats aggregate returned no row"))?;

    Ok(Json(stats))
}

#[derive(Debug, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct CustomerStats {
    pub total_vendas: i64,
    pub vendas_identificadas: i64,
    pub percentual_identificadas: Option<f64>,
    pub percentual_guest: Option<f64>,
}

#[tracing::instrument(name = "GET /analytics/customer-stats", skip(state))]
pub async fn customer_stats(
    State(state): State<AppState>,
    Query(params): Query<BrandScope>,
) -> Result<Json<CustomerStats>, ApiError> {
    let mut q = SqlBuilder::new(
        "WITH base AS ( \
           SELECT s.id, s.customer_id \
           FROM sales s \
           LEFT JOIN stores st ON st.id = s.store_id \
           WHERE s.sale_status_desc = 'COMPLETED'",
    );
    if let Some(brand_id) = params.brand_id {
        q.push_filter(" AND st.brand_id = ", brand_id);
    }
    q.push(
        ") \
         SELECT \
           COUNT(*)::bigint AS total_vendas, \
           COUNT(*) FILTER (WHERE customer_id IS NOT NULL)::bigint AS vendas_identificadas, \
           ROUND((COUNT(*) FILTER (WHERE customer_id IS NOT NULL)::numeric / NULLIF(COUNT(*), 0)) * 100.0, 2)::float8 AS percentual_identificadas, \
           ROUND((COUNT(*) FILTER (WHERE customer_id IS NULL)::numeric / NULLIF(COUNT(*), 0)) * 100.0, 2)::float8 AS percentual_guest \
         FROM base",
    );

    let stats = CustomerStats::find_by_statement(q.into_statement())
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::internal("customer stats aggregate returned no row"))?;

    Ok(Json(stats))
}
