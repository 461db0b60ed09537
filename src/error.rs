//! # Cache Core Error Types
//!
//! Structured error handling for the cache core using thiserror. Store
//! failures are caught at the TTL and invalidation manager boundaries and
//! degraded to boolean or zero-count results; the variants here exist for the
//! layers that need to observe what went wrong.

use thiserror::Error;

/// Errors raised inside the cache core.
#[derive(Error, Debug)]
pub enum CacheCoreError {
    #[error("Store operation failed: {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Value serialization error: {message}")]
    Serialization { message: String },

    #[error("Malformed key template: {template}: placeholder {{{placeholder}}} not found in declared arguments")]
    MalformedTemplate {
        template: String,
        placeholder: String,
    },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Timeout: operation {operation} timed out after {timeout_seconds}s")]
    Timeout {
        operation: String,
        timeout_seconds: u64,
    },
}

impl CacheCoreError {
    /// Create a store operation error
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a malformed template error
    pub fn malformed_template(
        template: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self::MalformedTemplate {
            template: template.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_seconds,
        }
    }
}

impl From<serde_json::Error> for CacheCoreError {
    fn from(err: serde_json::Error) -> Self {
        CacheCoreError::serialization(err.to_string())
    }
}

/// Result type alias for cache core operations
pub type Result<T> = std::result::Result<T, CacheCoreError>;
