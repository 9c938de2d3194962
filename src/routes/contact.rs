use axum::Json;

use crate::{
    dto::contact::ContactRequest, error::AppResult, response::ApiResponse,
    routes::extract::ApiJson, services::contact_service,
};

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message accepted"),
        (status = 400, description = "Invalid email or message too short"),
    ),
    tag = "Contact"
)]
pub async fn submit_contact(
    ApiJson(payload): ApiJson<ContactRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(contact_service::submit_contact(payload).await?))
}
