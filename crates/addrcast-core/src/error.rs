//! Centralized error types for the forecast service.
//!
//! This module provides a typed error hierarchy that:
//! - Separates upstream transport failures from malformed upstream payloads
//! - Provides short messages suitable for API consumers
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` for text returned to clients and `status_code()` for the
/// HTTP status the endpoint layer should answer with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Returns a short, non-technical message for API responses.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
        }
    }

    /// HTTP status hint: 502 when an upstream service failed us, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Network(_) | AppError::Forecast(_) => 502,
            AppError::Config(_) => 500,
        }
    }
}

/// Transport-level failures talking to an upstream service (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Unable to reach an upstream service.",
            NetworkError::Timeout => "An upstream service timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "An upstream service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "An upstream service rejected the request.",
        }
    }
}

/// Errors raised while resolving a forecast.
///
/// A geocode with no match is not an error; it is reported as a normal
/// not-found outcome by the pipeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] NetworkError),

    #[error("Malformed {service} response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },
}

impl ForecastError {
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        ForecastError::MalformedResponse {
            service,
            message: message.into(),
        }
    }

    /// True for transport and status failures, false for bad payloads.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ForecastError::Upstream(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::Upstream(e) => e.user_message(),
            ForecastError::MalformedResponse { .. } => {
                "Received an unexpected response from an upstream service."
            }
        }
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(e: reqwest::Error) -> Self {
        ForecastError::Upstream(e.into_network_error())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
