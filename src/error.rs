use std::fmt;

use rusqlite;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightErrorCode {
    MissingApiKey,
    HttpTimeout,
    RateLimited,
    InvalidResponse,
    ProviderUnavailable,
    Unknown,
}

impl InsightErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightErrorCode::MissingApiKey => "MISSING_API_KEY",
            InsightErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            InsightErrorCode::RateLimited => "RATE_LIMITED",
            InsightErrorCode::InvalidResponse => "INVALID_RESPONSE",
            InsightErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            InsightErrorCode::Unknown => "UNKNOWN_INSIGHT_ERROR",
        }
    }
}

impl fmt::Display for InsightErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("authentication required")]
    Unauthorized,

    #[error("access denied: {message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Insight {
        code: InsightErrorCode,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation { message }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn unauthorized() -> Self {
        warn!(target: "app::auth", "request not authenticated");
        AppError::Unauthorized
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::auth", %message, "access denied");
        AppError::Forbidden { message }
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn insight(code: InsightErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::insight", code = %code, %message, "insight provider error");
        AppError::Insight { code, message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn insight_code(&self) -> Option<InsightErrorCode> {
        match self {
            AppError::Insight { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("unique or foreign key constraint violated")
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
