use axum::{Json, extract::State};

use crate::{
    dto::products::{BrandList, CategoryList},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories", body = ApiResponse<CategoryList>)),
    tag = "Products"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "Active brands", body = ApiResponse<BrandList>)),
    tag = "Products"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BrandList>>> {
    Ok(Json(catalog_service::list_brands(&state).await?))
}
