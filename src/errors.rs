//! # Application Error Types
//!
//! This module defines the error types shared by configuration loading,
//! the tariff catalogue and the bot handlers.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (catalogue entries, inputs, etc.)
    Validation(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            "Telegram request failed"
        );
    }

    /// Log order intake errors with the submitted plan
    pub fn log_order_error(
        error: &impl std::fmt::Display,
        chat_id: i64,
        plan: Option<&str>,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            chat_id = %chat_id,
            plan = ?plan,
            input_value = ?input_value.map(truncate_for_log),
            "Order processing failed"
        );
    }

    /// Log payment errors with the echoed invoice payload
    pub fn log_payment_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        invoice_payload: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            invoice_payload = ?invoice_payload.map(truncate_for_log),
            "Payment processing failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }

    fn truncate_for_log(value: &str) -> String {
        if value.chars().count() > 100 {
            format!("{}...", value.chars().take(100).collect::<String>())
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_tags() {
        assert_eq!(
            AppError::Config("missing token".to_string()).to_string(),
            "[CONFIG] missing token"
        );
        assert_eq!(
            AppError::Validation("bad tariff".to_string()).to_string(),
            "[VALIDATION] bad tariff"
        );
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err, AppError::Internal("boom".to_string()));
    }
}
