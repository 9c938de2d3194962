use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::extract::ApiJson,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(create_session))
}

#[utoipa::path(
    post,
    path = "/api/checkout/session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed from the current cart", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Cart is empty or address invalid"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = checkout_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}
