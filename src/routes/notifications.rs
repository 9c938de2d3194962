use axum::{Json, extract::State};

use crate::{
    dto::notifications::NotificationList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::notification_service,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Up to five open orders as notices", body = ApiResponse<NotificationList>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<NotificationList>>> {
    let resp = notification_service::list_notifications(&state, &user).await?;
    Ok(Json(resp))
}
