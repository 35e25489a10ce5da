//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Broker unreachable or connection lost
    #[error("broker connection to {endpoint} failed: {source}")]
    BrokerConnection {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    /// Queue declaration rejected
    #[error("failed to declare queue '{queue}': {source}")]
    Declare {
        queue: String,
        #[source]
        source: ContractError,
    },
}

impl DispatcherError {
    /// Create a broker connection error
    pub fn broker_connection(endpoint: impl Into<String>, source: ContractError) -> Self {
        Self::BrokerConnection {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create a queue declaration error
    pub fn declare(queue: impl Into<String>, source: ContractError) -> Self {
        Self::Declare {
            queue: queue.into(),
            source,
        }
    }

    /// Connection-level failure (connect, declare or lost mid-run); the run is fatal
    pub fn is_broker_connection(&self) -> bool {
        matches!(self, Self::BrokerConnection { .. } | Self::Declare { .. })
    }
}
