use axum::Json;
use axum::extract::{Path, State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::channel;
use crate::error::ApiError;
use crate::state::AppState;

#[tracing::instrument(name = "GET /brands/{brand_id}/channels", skip(state))]
pub async fn get_channels(
    State(state): State<AppState>,
    Path(brand_id): Path<i64>,
) -> Result<Json<Vec<channel::Model>>, ApiError> {
    let channels = channel::Entity::find()
        .filter(channel::Column::BrandId.eq(brand_id))
        .order_by_asc(channel::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(channels))
}
