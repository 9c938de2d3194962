use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::wishlist::{WishlistCheck, WishlistList, WishlistRemoval, WishlistRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::WishlistItem,
    response::ApiResponse,
    routes::extract::{ApiJson, ApiPath},
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_wishlist)
                .post(add_to_wishlist)
                .delete(remove_from_wishlist),
        )
        .route("/check/{product_id}", get(check_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses((status = 200, description = "Wishlisted products", body = ApiResponse<WishlistList>)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::list_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = WishlistRequest,
    responses(
        (status = 200, description = "Added", body = ApiResponse<WishlistItem>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Already in wishlist"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<WishlistRequest>,
) -> AppResult<Json<ApiResponse<WishlistItem>>> {
    let resp = wishlist_service::add_to_wishlist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist",
    request_body = WishlistRequest,
    responses((status = 200, description = "Whether a row was removed", body = ApiResponse<WishlistRemoval>)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<WishlistRequest>,
) -> AppResult<Json<ApiResponse<WishlistRemoval>>> {
    let resp = wishlist_service::remove_from_wishlist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wishlist/check/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Membership flag", body = ApiResponse<WishlistCheck>)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn check_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(product_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistCheck>>> {
    let resp = wishlist_service::check_wishlist(&state, &user, product_id).await?;
    Ok(Json(resp))
}
