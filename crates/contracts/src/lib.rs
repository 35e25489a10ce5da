//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the dispatch pipeline:
//! identifiers, wire messages, config blueprint, error taxonomy and the two
//! outward-facing traits (`ListingClient`, `BrokerConnector`/`MessageBroker`).
//! All business crates can only depend on this crate, reverse dependencies are prohibited.

mod blueprint;
mod broker;
mod error;
mod ids;
mod listing;
mod message;

pub use blueprint::*;
pub use broker::{BrokerConnector, LocalBrokerConnector, LocalMessageBroker, MessageBroker, QueueSpec};
pub use error::*;
pub use ids::{file_name, CollectionId, PartFile, Partition};
pub use listing::{ListingClient, LocalListingClient};
pub use message::{AuditRecord, WorkItem};
