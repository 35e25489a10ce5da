//! Message broker traits - Dispatcher output interface
//!
//! A `BrokerConnector` opens one connection; the resulting `MessageBroker`
//! holds a single channel on it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Queue declaration parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, durable: bool) -> Self {
        Self {
            name: name.into(),
            durable,
        }
    }
}

/// An open broker channel
#[trait_variant::make(MessageBroker: Send)]
pub trait LocalMessageBroker {
    /// Broker name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Declare a queue
    ///
    /// Must succeed when the queue already exists with matching parameters.
    async fn declare_queue(&mut self, queue: &QueueSpec) -> Result<(), ContractError>;

    /// Publish one message to `queue` through the default exchange
    ///
    /// Fire-and-forget: no delivery confirmation is awaited.
    async fn publish(&mut self, queue: &str, payload: Bytes) -> Result<(), ContractError>;

    /// Release channel and connection
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Opens broker connections
#[trait_variant::make(BrokerConnector: Send)]
pub trait LocalBrokerConnector {
    type Broker: MessageBroker + Send;

    /// Human-readable target (host, URI without credentials)
    fn endpoint(&self) -> String;

    /// Open one connection with one channel
    ///
    /// # Errors
    /// Returns `ContractError::BrokerConnection` when unreachable
    async fn connect(&self) -> Result<Self::Broker, ContractError>;
}
