use std::time::Duration;

use crate::{
    dto::contact::ContactRequest,
    error::AppResult,
    response::{ApiResponse, Meta},
};

const PROCESSING_DELAY: Duration = Duration::from_secs(1);

/// Messages are only logged; there is no mail delivery behind this.
pub async fn submit_contact(payload: ContactRequest) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;

    tracing::info!(
        name = %payload.name,
        email = %payload.email,
        subject = %payload.subject,
        message_len = payload.message.len(),
        "contact form submitted"
    );
    tokio::time::sleep(PROCESSING_DELAY).await;

    Ok(ApiResponse::success(
        "Thanks for reaching out. We will get back to you soon.",
        serde_json::json!({ "success": true }),
        Some(Meta::empty()),
    ))
}
