//! Типы ошибок страницы подключения.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMIT_DETAIL: &str = "Too many requests. Please try again in 5 minutes.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Не найдено: {0}")]
    NotFound(String),

    #[error("Слишком много запросов")]
    TooManyRequests,

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),

    #[error("Неверный запрос: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::TooManyRequests => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_DETAIL.to_string())
            }
            AppError::Internal(m) => {
                // Подробности остаются в логе, клиенту уходит общий текст
                tracing::error!("Внутренняя ошибка: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
        };
        (status, axum::Json(json!({ "detail": message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Internal(format!("ошибка БД: {e}"))
    }
}
