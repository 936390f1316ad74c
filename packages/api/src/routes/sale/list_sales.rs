//! Paginated sale listing with store/channel/brand names joined in.

use axum::Json;
use axum::extract::{Query, State};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{brand, channel, sale, store};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

#[derive(Clone, Debug, Deserialize)]
pub struct ListSalesParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub brand_id: Option<i64>,
    pub store_id: Option<i64>,
    pub channel_id: Option<i64>,
}

#[derive(Debug, FromQueryResult, Serialize, ToSchema)]
pub struct SaleRow {
    pub id: i64,
    pub store_id: i64,
    pub channel_id: i64,
    pub customer_id: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    pub total_amount: f64,
    pub total_discount: f64,
    pub delivery_fee: f64,
    pub delivery_seconds: Option<i32>,
    pub sale_status_desc: String,
    pub store_name: Option<String>,
    pub channel_name: Option<String>,
    pub brand_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListSalesResponse {
    pub data: Vec<SaleRow>,
    pub pagination: Pagination,
}

#[utoipa::path(
    get,
    path = "/sales",
    tag = "sales",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size (max 500)"),
        ("brand_id" = Option<i64>, Query, description = "Restrict to one brand"),
        ("store_id" = Option<i64>, Query, description = "Restrict to one store"),
        ("channel_id" = Option<i64>, Query, description = "Restrict to one channel"),
    ),
    responses(
        (status = 200, description = "Sales ordered by creation date descending", body = ListSalesResponse)
    )
)]
#[tracing::instrument(name = "GET /sales", skip(state))]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<ListSalesParams>,
) -> Result<Json<ListSalesResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let mut select = sale::Entity::find()
        .column_as(store::Column::Name, "store_name")
        .column_as(channel::Column::Name, "channel_name")
        .column_as(brand::Column::Name, "brand_name")
        .join(JoinType::LeftJoin, sale::Relation::Store.def())
        .join(JoinType::LeftJoin, sale::Relation::Channel.def())
        .join(JoinType::LeftJoin, store::Relation::Brand.def())
        // Id as tie-breaker keeps page boundaries stable for equal timestamps.
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id);

    if let Some(brand_id) = params.brand_id {
        select = select.filter(store::Column::BrandId.eq(brand_id));
    }
    if let Some(store_id) = params.store_id {
        select = select.filter(sale::Column::StoreId.eq(store_id));
    }
    if let Some(channel_id) = params.channel_id {
        select = select.filter(sale::Column::ChannelId.eq(channel_id));
    }

    let paginator = select.into_model::<SaleRow>().paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page - 1).await?;

    Ok(Json(ListSalesResponse {
        data,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        },
    }))
}

#[cfg(test)]
mod tests {
    #[test]
    fn page_count_rounds_up() {
        assert_eq!(0u64.div_ceil(10), 0);
        assert_eq!(100u64.div_ceil(10), 10);
        assert_eq!(101u64.div_ceil(10), 11);
        assert_eq!(9u64.div_ceil(10), 1);
    }
}
