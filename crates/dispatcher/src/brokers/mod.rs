//! Broker implementations
//!
//! Contains AmqpConnector, InMemoryBroker, and LogConnector.

mod amqp;
mod log;
mod memory;

pub use self::amqp::{AmqpBroker, AmqpConnector};
pub use self::log::{LogBroker, LogConnector};
pub use self::memory::{InMemoryBroker, InMemoryChannel};
