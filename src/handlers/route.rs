use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::EntityTrait;

use crate::entities::route;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// List all routes
pub async fn list_routes(State(state): State<AppState>) -> AppResult<Json<Vec<route::Model>>> {
    let routes = route::Entity::find().all(&state.db).await?;
    Ok(Json(routes))
}

/// Get route details
pub async fn get_route(
    State(state): State<AppState>,
    Path(route_id): Path<i32>,
) -> AppResult<Json<route::Model>> {
    let route = route::Entity::find_by_id(route_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))?;

    Ok(Json(route))
}
