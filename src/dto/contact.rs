use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{auth::is_plausible_email, require_text};
use crate::error::{AppError, AppResult};

pub const MIN_MESSAGE_LEN: usize = 10;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name, 100)?;
        if !is_plausible_email(&self.email) {
            return Err(AppError::BadRequest("Valid email is required".into()));
        }
        require_text("subject", &self.subject, 200)?;
        if self.message.trim().chars().count() < MIN_MESSAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "message must be at least {MIN_MESSAGE_LEN} characters"
            )));
        }
        Ok(())
    }
}
