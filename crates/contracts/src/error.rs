//! Layered error definitions
//!
//! Categorized by source: config / discovery / broker / ledger

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Discovery Errors =====
    /// The collection root holds no partitions
    #[error("no partitions found for collection '{collection}' under {root}")]
    NoPartitionsFound { collection: String, root: String },

    /// The listing capability failed
    #[error("listing '{path}' failed: {message}")]
    Listing { path: String, message: String },

    // ===== Broker Errors =====
    /// Cannot establish or keep the broker connection
    #[error("broker connection error: {message}")]
    BrokerConnection { message: String },

    /// A single message failed to send
    #[error("publish to queue '{queue}' failed: {message}")]
    Publish { queue: String, message: String },

    // ===== Ledger Errors =====
    /// Dispatch ledger could not be read or written
    #[error("ledger error at {path}: {message}")]
    Ledger { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create listing error
    pub fn listing(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listing {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create broker connection error
    pub fn broker_connection(message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            queue: queue.into(),
            message: message.into(),
        }
    }

    /// Create ledger error
    pub fn ledger(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ledger {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Discovery failures abort the run before any broker connection
    pub fn is_discovery(&self) -> bool {
        matches!(self, Self::NoPartitionsFound { .. } | Self::Listing { .. })
    }
}
