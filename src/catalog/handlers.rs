use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    catalog::{
        dto::ItemFilter,
        repo_types::{Category, Item},
    },
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/kategori", get(list_categories))
        .route("/makanan", get(list_items))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.catalog.list_categories().await?;
    debug!(count = categories.len(), "categories listed");
    Ok(Json(ApiResponse::ok("Success", categories)))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    filter: Result<Query<ItemFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Item>>>, ApiError> {
    let Query(filter) = filter?;
    let items = state.catalog.list_items(filter.kategori_id).await?;
    debug!(count = items.len(), kategori_id = ?filter.kategori_id, "items listed");
    Ok(Json(ApiResponse::ok("Success", items)))
}
