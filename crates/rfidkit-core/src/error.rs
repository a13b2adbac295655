//! Error handling for rfidkit
//!
//! Provides error types for all layers of the bridge:
//! - Driver errors (reported by the native scanner collaborator)
//! - Config errors (interpreting an opaque scanner configuration)
//! - Bridge errors (global instance and vocabulary lookups)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Driver error type
///
/// Represents failures reported synchronously by a scanner driver.
/// The bridge logs these and never hands them back to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// Reader is not connected
    #[error("Reader not connected")]
    NotConnected,

    /// Reader was never initialised
    #[error("Reader not initialised")]
    NotInitialised,

    /// No reader device could be found
    #[error("No connected device")]
    DeviceUnavailable,

    /// The call is not valid in the current reader state
    #[error("Invalid usage: {reason}")]
    InvalidUsage {
        /// Why the call was rejected.
        reason: String,
    },

    /// The reader accepted the call but the operation failed
    #[error("Operation failed: {reason}")]
    OperationFailed {
        /// The failure reported by the reader.
        reason: String,
    },

    /// The driver does not implement this operation
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// The name of the unsupported operation.
        operation: String,
    },

    /// The scanner configuration could not be interpreted
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic driver error
    #[error("Driver error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Configuration error type
///
/// Raised by drivers that interpret the keys of a `ScannerConfig`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Unknown memory bank name
    #[error("Invalid memory bank: {value}")]
    InvalidMemoryBank {
        /// The rejected memory bank name.
        value: String,
    },

    /// Unknown lock target
    #[error("Invalid lock target: {value}")]
    InvalidLockTarget {
        /// The rejected lock target.
        value: String,
    },

    /// A key holds a value of the wrong shape
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A key required by the requested operation is absent
    #[error("Missing configuration key: {key}")]
    MissingKey {
        /// The missing key.
        key: String,
    },

    /// Configuration JSON was not an object
    #[error("Scanner configuration must be a JSON object")]
    NotAnObject,
}

/// Bridge error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The process-wide bridge already exists
    #[error("Scanner bridge already initialized")]
    AlreadyInitialized,

    /// Event category name not in the vocabulary
    #[error("Unknown event category: {name}")]
    UnknownCategory {
        /// The unrecognised name.
        name: String,
    },

    /// Beeper volume name not in the vocabulary
    #[error("Unknown beeper volume: {name}")]
    UnknownBeeperVolume {
        /// The unrecognised name.
        name: String,
    },
}

/// Main error type for rfidkit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Driver error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Config error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a driver error
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Error::Driver(_))
    }

    /// Check if this is a config error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Driver(DriverError::Config(_)))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by driver calls
pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        assert_eq!(DriverError::NotConnected.to_string(), "Reader not connected");
        assert_eq!(
            DriverError::DeviceUnavailable.to_string(),
            "No connected device"
        );
        let err = DriverError::OperationFailed {
            reason: "TAG MEMORY LOCKED ERROR".to_string(),
        };
        assert_eq!(err.to_string(), "Operation failed: TAG MEMORY LOCKED ERROR");
    }

    #[test]
    fn test_config_error_passes_through_driver_error() {
        let err: DriverError = ConfigError::InvalidMemoryBank {
            value: "flash".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid memory bank: flash");

        let err: Error = err.into();
        assert!(err.is_driver_error());
        assert!(err.is_config_error());
    }

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError::UnknownCategory {
            name: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown event category: barcode");
        assert_eq!(
            BridgeError::AlreadyInitialized.to_string(),
            "Scanner bridge already initialized"
        );
    }
}
