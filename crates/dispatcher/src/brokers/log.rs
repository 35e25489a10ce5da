//! LogBroker - logs publishes via tracing instead of sending them
//!
//! Backs `--dry-run`: the whole pipeline runs, nothing reaches a broker.

use bytes::Bytes;
use contracts::{BrokerConnector, ContractError, MessageBroker, QueueSpec};
use tracing::{info, instrument};

/// Connector handing out log-only brokers
#[derive(Debug, Clone)]
pub struct LogConnector {
    name: String,
}

impl LogConnector {
    /// Create a new LogConnector with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BrokerConnector for LogConnector {
    type Broker = LogBroker;

    fn endpoint(&self) -> String {
        format!("log://{}", self.name)
    }

    async fn connect(&self) -> Result<LogBroker, ContractError> {
        Ok(LogBroker::new(&self.name))
    }
}

/// Broker that logs every message
pub struct LogBroker {
    name: String,
    published: u64,
}

impl LogBroker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            published: 0,
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl MessageBroker for LogBroker {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_broker_declare", skip(self, queue), fields(broker = %self.name))]
    async fn declare_queue(&mut self, queue: &QueueSpec) -> Result<(), ContractError> {
        info!(queue = %queue.name, durable = queue.durable, "Would declare queue");
        Ok(())
    }

    #[instrument(name = "log_broker_publish", skip(self, payload), fields(broker = %self.name))]
    async fn publish(&mut self, queue: &str, payload: Bytes) -> Result<(), ContractError> {
        self.published += 1;
        info!(
            queue = %queue,
            body = %String::from_utf8_lossy(&payload),
            "Would publish"
        );
        Ok(())
    }

    #[instrument(name = "log_broker_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(broker = %self.name, published = self.published, "LogBroker closed");
        Ok(())
    }
}
