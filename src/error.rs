//! Error types and handling for the snippet search engine

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Code analysis failed: {0}")]
    AnalysisFailed(String),
    #[error("Index unavailable for tenant {tenant}: {reason}")]
    IndexUnavailable { tenant: String, reason: String },
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::AnalysisFailed(_) => "analysis_failed",
            AppError::IndexUnavailable { .. } => "index_unavailable",
            AppError::NotImplemented(_) => "not_implemented",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether a caller could reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::IndexUnavailable { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

/// Validate a tenant identifier before it is used as a cache key
pub fn validate_tenant(tenant: &str) -> Result<(), AppError> {
    if tenant.trim().is_empty() {
        return Err(AppError::InvalidInput("Tenant id cannot be empty".to_string()));
    }
    if tenant.len() > 256 {
        return Err(AppError::InvalidInput(
            "Tenant id too long, maximum 256 characters".to_string(),
        ));
    }
    Ok(())
}
