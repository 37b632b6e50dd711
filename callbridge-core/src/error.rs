//! Error types for callbridge-core
//!
//! None of these cross the host boundary: the registry logs them and turns
//! the failed operation into a no-op or a sentinel value.

use thiserror::Error;

/// Top-level error type for callbridge-core
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors reported by the underlying communication SDK
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Failed to create call: {0}")]
    CallFailed(String),

    #[error("{operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Client is not connected")]
    NotConnected,
}

impl SdkError {
    /// Shorthand for a failed named SDK operation
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while reading client options
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid JSON options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid option {field}: {reason}")]
    Invalid { field: String, reason: String },
}
