//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP frontend,
//! the auth/guard stack and the record modules, along with a mapper to HTTP
//! status codes. Every variant carries a stable code and a human message.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    Validation { code: String, message: String },
    DuplicateUsername { code: String, message: String },
    InvalidCredentials { code: String, message: String },
    Unauthenticated { code: String, message: String },
    Forbidden { code: String, message: String },
    CostExceeded { code: String, message: String, cost: u64, limit: u64 },
    NotFound { code: String, message: String },
    Infrastructure { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::DuplicateUsername { code, .. }
            | AppError::InvalidCredentials { code, .. }
            | AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::CostExceeded { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Infrastructure { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::DuplicateUsername { message, .. }
            | AppError::InvalidCredentials { message, .. }
            | AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::CostExceeded { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Infrastructure { message, .. } => message.as_str(),
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation { code: "validation_error".into(), message: msg.into() }
    }

    pub fn duplicate_username() -> Self {
        AppError::DuplicateUsername { code: "duplicate_username".into(), message: "Username already exists".into() }
    }

    /// Single constructor for both unknown-user and wrong-password so the two
    /// causes are indistinguishable to the caller (no username enumeration).
    pub fn invalid_credentials() -> Self {
        AppError::InvalidCredentials { code: "invalid_credentials".into(), message: "Invalid credentials".into() }
    }

    pub fn unauthenticated<S: Into<String>>(msg: S) -> Self {
        AppError::Unauthenticated { code: "unauthenticated".into(), message: msg.into() }
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        AppError::Forbidden { code: "forbidden".into(), message: msg.into() }
    }

    pub fn cost_exceeded(cost: u64, limit: u64) -> Self {
        AppError::CostExceeded {
            code: "query_cost_exceeded".into(),
            message: format!("Query is too expensive: {}. Maximum allowed cost: {}", cost, limit),
            cost,
            limit,
        }
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        AppError::NotFound { code: "not_found".into(), message: msg.into() }
    }

    /// Infrastructure failures carry a generic message outward; internal
    /// detail goes to the log at the call site, not into the response.
    pub fn infrastructure() -> Self {
        AppError::Infrastructure { code: "infrastructure_error".into(), message: "Service temporarily unavailable".into() }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::DuplicateUsername { .. } => 409,
            AppError::InvalidCredentials { .. } => 401,
            AppError::Unauthenticated { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::CostExceeded { .. } => 422,
            AppError::NotFound { .. } => 404,
            AppError::Infrastructure { .. } => 503,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("infrastructure failure: {err:#}");
        AppError::infrastructure()
    }
}
