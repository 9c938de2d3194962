pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod wishlist;

use crate::error::{AppError, AppResult};

/// Reject blank required text and anything longer than `max` characters.
pub(crate) fn require_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    limit_text(field, trimmed, max)
}

pub(crate) fn limit_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Trim optional text and fold blanks into `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
