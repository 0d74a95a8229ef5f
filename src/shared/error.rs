use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validators::ValidationError;

/// Error type shared by the snapshot client, the poller and the prediction panel
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Transport, DNS or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Missing or unusable credential / setting
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("A prediction request is already in flight")]
    Busy,
}

/// Errors raised while turning an external body into a typed value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Invalid value for field {field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ParseError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl DashboardError {
    /// Stable machine-readable code for the results panel
    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::Network(_) => error_codes::NETWORK_ERROR,
            DashboardError::Parse(_) => error_codes::PARSE_ERROR,
            DashboardError::Config(_) => error_codes::CONFIG_ERROR,
            DashboardError::Validation(_) => error_codes::VALIDATION_ERROR,
            DashboardError::Busy => error_codes::REQUEST_IN_FLIGHT,
        }
    }

    pub fn to_response(&self, request_id: &str) -> ErrorResponse {
        ErrorResponse::new(self.code(), self.to_string(), request_id)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::InvalidJson(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Parse(err.into())
    }
}

/// Error payload shown on the results panel
/// Contains stable machine-readable error code, human-readable message, and request ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code (e.g., "NETWORK_ERROR")
    pub error: String,

    pub message: String,

    /// Request ID for tracing and debugging
    pub request_id: String,
}

impl ErrorResponse {
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub mod error_codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const REQUEST_IN_FLIGHT: &str = "REQUEST_IN_FLIGHT";
}
