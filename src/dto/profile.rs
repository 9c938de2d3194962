use serde::Deserialize;
use utoipa::ToSchema;

use super::{limit_text, require_text};
use crate::error::AppResult;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    /// Empty string clears the phone number.
    pub phone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name, 100)?;
        }
        if let Some(phone) = &self.phone {
            limit_text("phone", phone, 40)?;
        }
        Ok(())
    }
}
