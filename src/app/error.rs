use crate::utils::error::FoodError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDto {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// 5xx 只回傳通用訊息，細節寫進日誌；上游錯誤保留訊息與內容
impl IntoResponse for FoodError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match self {
            FoodError::UpstreamError {
                message, details, ..
            } => {
                tracing::error!("❌ Upstream failure: {} {}", message, details);
                ErrorDto {
                    error: message,
                    details: (!details.is_empty()).then_some(details),
                }
            }
            FoodError::PlanParseError { .. } => {
                tracing::warn!("⚠️ {}", self);
                ErrorDto::new(self.to_string())
            }
            err if err.is_internal() => {
                tracing::error!("❌ {} (💡 {})", err, err.recovery_suggestion());
                ErrorDto::new("Internal server error")
            }
            err => {
                tracing::debug!("Request rejected: {}", err);
                ErrorDto::new(err.user_friendly_message())
            }
        };

        (status, Json(body)).into_response()
    }
}
