//! Error types for the sync daemon.
//!
//! All errors implement `std::error::Error` via `thiserror`. Catalog errors
//! abort the current poll cycle only; device errors are isolated to the
//! affected device.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing VLAN gateway state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport or HTTP failure reaching the catalog API.
    #[error("catalog fetch failed: {url}: {source}")]
    CatalogFetch {
        /// The URL that failed.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// Catalog response had an unexpected shape or missing fields.
    #[error("catalog response malformed: {url}: {message}")]
    CatalogFormat {
        /// The URL whose response was malformed.
        url: String,
        /// What was wrong with the response.
        message: String,
    },

    /// Could not establish or authenticate a device session.
    #[error("session to '{device}' failed: {message}")]
    Session {
        /// The device address.
        device: String,
        /// What went wrong.
        message: String,
    },

    /// Device status output did not match the expected table shape.
    #[error("unexpected status output from '{device}': {message}")]
    DeviceParse {
        /// The device address.
        device: String,
        /// What was wrong with the output.
        message: String,
    },

    /// A write command was rejected by the device.
    #[error("apply {operation} on '{device}' failed: {message}")]
    Apply {
        /// The device address.
        device: String,
        /// The operation that was rejected (e.g., "delete vlan 200").
        operation: String,
        /// What went wrong.
        message: String,
    },

    /// Configuration loading or validation error.
    #[error("invalid configuration: {field}: {message}")]
    Config {
        /// The configuration field that failed validation.
        field: String,
        /// What was wrong with it.
        message: String,
    },
}

impl SyncError {
    /// Creates a catalog format error.
    pub fn catalog_format(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogFormat {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a session error.
    pub fn session(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Session {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Creates a device parse error.
    pub fn device_parse(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceParse {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Creates an apply error.
    pub fn apply(
        device: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Apply {
            device: device.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::session("10.20.0.11", "authentication rejected");
        assert_eq!(
            err.to_string(),
            "session to '10.20.0.11' failed: authentication rejected"
        );
    }

    #[test]
    fn test_apply_error_context() {
        let err = SyncError::apply("10.20.0.11", "delete vlan 200", "command rejected");
        let text = err.to_string();
        assert!(text.contains("10.20.0.11"));
        assert!(text.contains("delete vlan 200"));
    }

    #[test]
    fn test_config_error() {
        let err = SyncError::config("telemetry.sample_rate", "must be within [0.0, 1.0]");
        assert!(err.to_string().contains("telemetry.sample_rate"));
    }
}
