//! # Dispatcher
//!
//! 消息分发模块。
//!
//! 负责：
//! - 连接 broker 并声明 log / work 两个队列
//! - 每个 part file 先发 audit 消息，再发 work 消息
//! - 收集单条发布失败，按策略继续或中止
//! - 记录已分发分区 (可选 ledger)

pub mod brokers;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod metrics;

pub use brokers::{AmqpBroker, AmqpConnector, InMemoryBroker, InMemoryChannel, LogBroker, LogConnector};
pub use contracts::{BrokerConnector, MessageBroker, PartFile};
pub use dispatcher::{
    DispatchReport, Dispatcher, DispatcherConfig, MessageKind, PublishFailure,
};
pub use error::DispatcherError;
pub use ledger::{DispatchLedger, LedgerRecord};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
