use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{limit_text, require_text};
use crate::error::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> AppResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::BadRequest(
                "rating must be between 1 and 5".into(),
            ));
        }
        require_text("title", &self.title, MAX_TITLE_LEN)?;
        if let Some(comment) = &self.comment {
            limit_text("comment", comment, MAX_COMMENT_LEN)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{CreateReviewRequest, MAX_COMMENT_LEN};

    fn review(rating: i32, title: &str, comment: Option<String>) -> CreateReviewRequest {
        CreateReviewRequest {
            product_id: Uuid::new_v4(),
            rating,
            title: title.into(),
            comment,
        }
    }

    #[test]
    fn rating_must_be_one_to_five() {
        assert!(review(0, "Meh", None).validate().is_err());
        assert!(review(6, "Wow", None).validate().is_err());
        assert!(review(1, "Bad", None).validate().is_ok());
        assert!(review(5, "Great", None).validate().is_ok());
    }

    #[test]
    fn title_required_and_comment_capped() {
        assert!(review(4, "   ", None).validate().is_err());
        assert!(review(4, &"t".repeat(101), None).validate().is_err());
        let long_comment = "c".repeat(MAX_COMMENT_LEN + 1);
        assert!(review(4, "Fine", Some(long_comment)).validate().is_err());
        assert!(review(4, "Fine", Some("c".repeat(MAX_COMMENT_LEN))).validate().is_ok());
    }
}
