//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Batch Dispatch - hand the latest partition of a collection to the workers
#[derive(Parser, Debug)]
#[command(
    name = "batch-dispatch",
    author,
    version,
    about = "Dispatch the latest partition of a batch collection",
    long_about = "Locates the most recent output partition of a collection, enumerates its \n\
                  part files and publishes each one to the work queue, preceded by an \n\
                  audit record on the log queue."
)]
pub struct Cli {
    /// Collection whose latest partition is dispatched
    pub collection: String,

    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "BATCH_DISPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override broker host from configuration
    #[arg(long, env = "BATCH_DISPATCH_BROKER_HOST")]
    pub broker_host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "BATCH_DISPATCH_BROKER_PORT")]
    pub broker_port: Option<u16>,

    /// Log messages instead of publishing them
    #[arg(long)]
    pub dry_run: bool,

    /// Dispatch even if the ledger already records the partition
    #[arg(long)]
    pub force: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "BATCH_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        env = "BATCH_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BATCH_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
