use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    /// Purchase-scoped variant of not-found: the referenced trip is absent,
    /// which is a caller mistake (400) rather than a missing route (404).
    #[error("This trip does not exist. Please check trip information.")]
    TripNotFound,

    #[error("You are not allowed to purchase more than {0} tickets")]
    LimitExceeded(usize),

    #[error("You are not allowed to purchase tickets for more than 2 male passengers")]
    MaleQuotaExceeded,

    #[error("Capacity is full. Please search another trip")]
    Capacity,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) | AppError::Duplicate(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::TripNotFound
            | AppError::LimitExceeded(_)
            | AppError::MaleQuotaExceeded
            | AppError::Capacity => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Payment(_) | AppError::Delivery(_) => {
                tracing::error!(error = %self, "external service failure");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(_) | AppError::Database(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "There is something wrong. Please try again later".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
