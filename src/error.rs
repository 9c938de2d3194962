use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Not enough stock available")]
    InsufficientStock { product_id: Uuid, available: i32 },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0}")]
    Duplicate(String),

    #[error("Database error")]
    DbError(sqlx::Error),

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::InsufficientStock { .. } | AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable reason carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "invalid_input",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::EmptyCart => "empty_cart",
            AppError::Duplicate(_) => "duplicate",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if unique {
            AppError::Duplicate("Resource already exists".into())
        } else {
            AppError::DbError(err)
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Duplicate("Resource already exists".into())
            }
            _ => AppError::OrmError(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i32>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // storage details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let (product_id, available) = match &self {
            AppError::InsufficientStock {
                product_id,
                available,
            } => (Some(*product_id), Some(*available)),
            _ => (None, None),
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                code: self.code(),
                product_id,
                available,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use uuid::Uuid;

    use super::AppError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_carry_reason_code() {
        let (status, body) = body_json(AppError::EmptyCart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["data"]["code"], "empty_cart");
        assert_eq!(body["message"], "Cart is empty");

        let (status, body) = body_json(AppError::NotFound("Product")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");

        let (status, body) = body_json(AppError::Duplicate("Already reviewed".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["data"]["code"], "duplicate");
    }

    #[tokio::test]
    async fn insufficient_stock_reports_availability() {
        let product_id = Uuid::new_v4();
        let (status, body) = body_json(AppError::InsufficientStock {
            product_id,
            available: 3,
        })
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["data"]["code"], "insufficient_stock");
        assert_eq!(body["data"]["available"], 3);
        assert_eq!(body["data"]["product_id"], product_id.to_string());
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let (status, body) =
            body_json(AppError::Internal(anyhow::anyhow!("connection refused on 5432"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["data"]["code"], "internal");
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("5432"));
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = AppError::Unauthorized("Missing Authorization header".into());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "unauthorized");
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
