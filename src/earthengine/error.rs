//! Error types for the Earth Engine backend.

use crate::config::ConfigError;
use crate::export::ExportError;
use thiserror::Error;

/// Errors raised by the Earth Engine backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EarthEngineError {
    /// Raised when the high-level configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request is missing a required field.
    #[error("invalid export request: {0}")]
    Validation(String),
    /// Raised when the HTTP exchange itself fails.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the API rejects a call.
    #[error("Earth Engine rejected {action} with HTTP {status}: {message}")]
    Api {
        /// Call being performed, for example `table export`.
        action: String,
        /// HTTP status code.
        status: u16,
        /// Error message reported by the API.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("unexpected response to {action}: {message}")]
    Decode {
        /// Call being performed.
        action: String,
        /// Decoder message.
        message: String,
    },
}

impl From<ExportError> for EarthEngineError {
    fn from(value: ExportError) -> Self {
        match value {
            ExportError::Validation(field) => Self::Validation(field),
        }
    }
}

impl From<ConfigError> for EarthEngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for EarthEngineError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}
