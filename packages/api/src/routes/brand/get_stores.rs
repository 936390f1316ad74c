use axum::Json;
use axum::extract::{Path, State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::store;
use crate::error::ApiError;
use crate::state::AppState;

#[tracing::instrument(name = "GET /brands/{brand_id}/stores", skip(state))]
pub async fn get_stores(
    State(state): State<AppState>,
    Path(brand_id): Path<i64>,
) -> Result<Json<Vec<store::Model>>, ApiError> {
    let stores = store::Entity::find()
        .filter(store::Column::BrandId.eq(brand_id))
        .order_by_asc(store::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(stores))
}
