//! DispatchBlueprint - Config Loader output
//!
//! Describes one deployment: where partitions live, how to list them, which
//! broker and queues receive the dispatch, and the dispatch policy.
//! Every field defaults to the reference deployment so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{CollectionId, QueueSpec};

/// Placeholder substituted in path and command templates
pub const TEMPLATE_PLACEHOLDER: &str = "{}";

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DispatchBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Partition storage and listing
    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Message broker endpoint
    #[serde(default)]
    #[validate(nested)]
    pub broker: BrokerConfig,

    /// Destination queues
    #[serde(default)]
    #[validate(nested)]
    pub queues: QueueConfig,

    /// Dispatch policy
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,
}

/// Where the upstream job writes its partitions
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    /// Collection output root, `{}` is replaced by the collection id
    #[validate(length(min = 1, message = "output_root_template cannot be empty"))]
    pub output_root_template: String,

    /// Listing backend
    pub listing: ListingKind,

    /// Listing command argv, `{}` is replaced by the path to list
    #[validate(length(min = 1, message = "listing_command_template cannot be empty"))]
    pub listing_command_template: String,

    /// Substring marking a data file in a partition
    #[validate(length(min = 1, message = "part_marker cannot be empty"))]
    pub part_marker: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_root_template: "/image-search-indexing/output/{}".to_string(),
            listing: ListingKind::Command,
            listing_command_template: "hdfs dfs -ls -C {}".to_string(),
            part_marker: "part-".to_string(),
        }
    }
}

impl StorageConfig {
    /// Output root holding the partitions of one collection
    pub fn collection_root(&self, collection: &CollectionId) -> String {
        self.output_root_template
            .replacen(TEMPLATE_PLACEHOLDER, collection.as_str(), 1)
    }
}

/// Listing backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    /// External command (e.g. `hdfs dfs -ls -C`)
    #[default]
    Command,
    /// Local filesystem directory
    Local,
}

/// AMQP broker endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host
    #[validate(length(min = 1, message = "broker host cannot be empty"))]
    pub host: String,

    /// Broker port
    #[validate(range(min = 1, message = "broker port must be > 0"))]
    pub port: u16,

    /// Virtual host
    pub vhost: String,

    /// Optional credentials (broker default when unset)
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5672,
            vhost: "/".to_string(),
            username: None,
            password: None,
        }
    }
}

impl BrokerConfig {
    /// Endpoint for logs, never carries credentials
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Destination queues
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue consumed by downstream workers
    #[validate(length(min = 1, message = "work queue name cannot be empty"))]
    pub work: String,

    /// Audit queue
    #[validate(length(min = 1, message = "log queue name cannot be empty"))]
    pub log: String,

    /// Declare queues durable
    pub durable: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            work: "nsfw".to_string(),
            log: "log".to_string(),
            durable: true,
        }
    }
}

impl QueueConfig {
    pub fn work_spec(&self) -> QueueSpec {
        QueueSpec::new(&self.work, self.durable)
    }

    pub fn log_spec(&self) -> QueueSpec {
        QueueSpec::new(&self.log, self.durable)
    }
}

/// Dispatch behavior
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DispatchConfig {
    /// First field of every audit record
    #[validate(length(min = 1, message = "source_tag cannot be empty"))]
    pub source_tag: String,

    /// What to do when a single publish fails
    pub on_publish_error: PublishErrorPolicy,

    /// Ledger of dispatched partitions (disabled when unset)
    pub ledger_path: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            source_tag: "nsfw".to_string(),
            on_publish_error: PublishErrorPolicy::Continue,
            ledger_path: None,
        }
    }
}

/// Reaction to a failed publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishErrorPolicy {
    /// Record the failure and keep dispatching
    #[default]
    Continue,
    /// Finish the current item, then stop the loop
    Abort,
}
