use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::reviews::CreateReviewRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    routes::extract::ApiJson,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_review))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = ApiResponse<Review>),
        (status = 400, description = "Rating, title or comment out of range"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product already reviewed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok(Json(resp))
}
