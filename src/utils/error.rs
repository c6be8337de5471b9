use thiserror::Error;

#[derive(Error, Debug)]
pub enum FoodError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream service returned {status}: {message}")]
    UpstreamError {
        status: u16,
        message: String,
        details: String,
    },

    #[error("Failed to parse meal plan: {message}")]
    PlanParseError { message: String },

    #[error("Data store error: {message}")]
    StoreError { message: String },
}

impl FoodError {
    /// 對應的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Conflict(_) => 409,
            // 上游 5xx 與 429 原樣回傳，其餘 (含上游 401) 視為閘道錯誤
            Self::UpstreamError { status, .. } if *status == 429 || (500..600).contains(status) => {
                *status
            }
            Self::UpstreamError { .. } => 502,
            Self::PlanParseError { .. } => 502,
            _ => 500,
        }
    }

    /// 是否為伺服器端錯誤 (需要記錄完整細節)
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            Self::IoError(e) => format!("File system error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigValidationError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the TOML configuration file against foodwell.example.toml"
            }
            Self::MissingConfigError { .. } => {
                "Add the missing setting to the configuration file or export the referenced environment variable"
            }
            Self::IoError(_) => "Verify that the data directory exists and is writable",
            Self::HttpError(_) | Self::UpstreamError { .. } => {
                "Check network connectivity and the configured service URLs"
            }
            _ => "See the logs for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, FoodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FoodError::Unauthorized.status_code(), 401);
        assert_eq!(FoodError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(FoodError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(FoodError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            FoodError::StoreError {
                message: "boom".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_upstream_status_is_propagated() {
        let err = FoodError::UpstreamError {
            status: 429,
            message: "Too Many Requests".into(),
            details: String::new(),
        };
        assert_eq!(err.status_code(), 429);

        let err = FoodError::UpstreamError {
            status: 401,
            message: "Unauthorized".into(),
            details: String::new(),
        };
        assert_eq!(err.status_code(), 502);
    }
}
