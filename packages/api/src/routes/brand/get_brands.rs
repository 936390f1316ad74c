use axum::Json;
use axum::extract::State;
use sea_orm::{EntityTrait, QueryOrder};

use crate::entity::brand;
use crate::error::ApiError;
use crate::state::AppState;

#[tracing::instrument(name = "GET /brands", skip(state))]
pub async fn get_brands(
    State(state): State<AppState>,
) -> Result<Json<Vec<brand::Model>>, ApiError> {
    let brands = brand::Entity::find()
        .order_by_asc(brand::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(brands))
}
