//! # Batch Dispatch CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与 CLI 覆盖
//! - 定位最新分区、枚举 part files、分发到队列
//! - 运行摘要与退出码

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::Cli;
use commands::run_dispatch;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging and optional metrics exporter based on CLI options
    let observability = ObservabilityConfig {
        log_format: cli.log_format.into(),
        ..Default::default()
    }
    .with_verbosity(cli.verbose, cli.quiet)
    .with_metrics_port(cli.metrics_port);
    observability::init_with_config(observability)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        collection = %cli.collection,
        "Batch dispatch starting"
    );

    let result = run_dispatch(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
