use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Not enough stock for item {item}")]
    InsufficientStock { item: String },

    #[error("Insufficient payment: {paid} paid, {required} required")]
    InsufficientPayment { required: i64, paid: i64 },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable discriminator carried in every error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Forbidden => "forbidden",
            AppError::StateConflict(_) => "state_conflict",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::InsufficientPayment { .. } => "insufficient_payment",
            AppError::DbError(_) => "db_error",
            AppError::OrmError(_) => "db_error",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    kind: &'static str,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::StateConflict(_) => StatusCode::CONFLICT,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::InsufficientPayment { .. } => StatusCode::BAD_REQUEST,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                kind: self.kind(),
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(AppError::NotFound.kind(), "not_found");
        assert_eq!(
            AppError::InsufficientStock {
                item: "Widget".into()
            }
            .kind(),
            "insufficient_stock"
        );
        assert_eq!(
            AppError::InsufficientPayment {
                required: 300,
                paid: 100
            }
            .kind(),
            "insufficient_payment"
        );
        assert_eq!(
            AppError::StateConflict("already completed".into()).kind(),
            "state_conflict"
        );
    }

    #[test]
    fn insufficient_stock_names_the_item() {
        let err = AppError::InsufficientStock {
            item: "Widget".into(),
        };
        assert!(err.to_string().contains("Widget"));
    }
}
