// --- File: crates/calgraph_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all calgraph errors.
///
/// Each crate keeps its own error enum and implements `From<SpecificError>`
/// for `CalgraphError`, so the console only has to deal with this one.
#[derive(Error, Debug)]
pub enum CalgraphError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The remote service answered with an error body
    #[error("External service error: {service_name} - {code}: {message}")]
    ExternalServiceError {
        service_name: String,
        code: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CalgraphError {
    /// A short, stable code for the error.
    ///
    /// For remote errors this is the code reported by the service
    /// (e.g. `ErrorItemNotFound`), otherwise the error category.
    pub fn code(&self) -> &str {
        match self {
            CalgraphError::HttpError(_) => "HttpError",
            CalgraphError::ParseError(_) => "ParseError",
            CalgraphError::ConfigError(_) => "ConfigError",
            CalgraphError::AuthError(_) => "AuthError",
            CalgraphError::ValidationError(_) => "ValidationError",
            CalgraphError::ExternalServiceError { code, .. } => code.as_str(),
            CalgraphError::NotFoundError(_) => "NotFound",
            CalgraphError::TimeoutError(_) => "Timeout",
            CalgraphError::InternalError(_) => "InternalError",
        }
    }

    /// The human readable part of the error, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            CalgraphError::HttpError(m)
            | CalgraphError::ParseError(m)
            | CalgraphError::ConfigError(m)
            | CalgraphError::AuthError(m)
            | CalgraphError::ValidationError(m)
            | CalgraphError::NotFoundError(m)
            | CalgraphError::TimeoutError(m)
            | CalgraphError::InternalError(m) => m.as_str(),
            CalgraphError::ExternalServiceError { message, .. } => message.as_str(),
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, CalgraphError>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, CalgraphError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| internal_error(format!("{}: {}", context, error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for CalgraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CalgraphError::TimeoutError(err.to_string())
        } else {
            CalgraphError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CalgraphError {
    fn from(err: serde_json::Error) -> Self {
        CalgraphError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for CalgraphError {
    fn from(err: std::io::Error) -> Self {
        internal_error(err)
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> CalgraphError {
    CalgraphError::ConfigError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> CalgraphError {
    CalgraphError::AuthError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> CalgraphError {
    CalgraphError::ValidationError(message.to_string())
}

pub fn external_service_error<C: fmt::Display, T: fmt::Display>(
    service_name: &str,
    code: C,
    message: T,
) -> CalgraphError {
    CalgraphError::ExternalServiceError {
        service_name: service_name.to_string(),
        code: code.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> CalgraphError {
    CalgraphError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_error_exposes_remote_code() {
        let err = external_service_error("Microsoft Graph", "ErrorItemNotFound", "gone");
        assert_eq!(err.code(), "ErrorItemNotFound");
        assert_eq!(err.message(), "gone");
        assert_eq!(
            err.to_string(),
            "External service error: Microsoft Graph - ErrorItemNotFound: gone"
        );
    }

    #[test]
    fn test_context_wraps_foreign_error() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = result.context("reading config.cfg").unwrap_err();
        assert_eq!(err.code(), "InternalError");
        assert_eq!(err.message(), "reading config.cfg: no such file");
    }

    #[test]
    fn test_helper_constructors_pick_category() {
        assert_eq!(validation_error("bad").code(), "ValidationError");
        assert_eq!(config_error("bad").code(), "ConfigError");
        assert_eq!(auth_error("bad").code(), "AuthError");
        assert_eq!(internal_error("bad").code(), "InternalError");
    }
}
