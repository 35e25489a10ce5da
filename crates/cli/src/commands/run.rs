//! Dispatch command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{BrokerConnector, CollectionId, DispatchBlueprint, ListingClient};
use discovery::ListingBackend;
use dispatcher::{AmqpConnector, LogConnector};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineStats};

/// Execute one dispatch run for `cli.collection`
pub async fn run_dispatch(cli: &Cli) -> Result<()> {
    let collection = CollectionId::new(cli.collection.as_str())?;
    let blueprint = load_blueprint(cli)?;

    if cli.print_config {
        println!("{}", ConfigLoader::to_toml(&blueprint)?);
        return Ok(());
    }

    info!(
        collection = %collection,
        root = %blueprint.storage.collection_root(&collection),
        listing = ?blueprint.storage.listing,
        broker = %blueprint.broker.endpoint(),
        work_queue = %blueprint.queues.work,
        log_queue = %blueprint.queues.log,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let listing = ListingBackend::from_config(&blueprint.storage)
        .context("Failed to set up listing backend")?;

    let stats = if cli.dry_run {
        execute(cli, &blueprint, listing, LogConnector::new("dry-run"), &collection).await?
    } else {
        let connector = AmqpConnector::new(&blueprint.broker);
        execute(cli, &blueprint, listing, connector, &collection).await?
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize run summary")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    check_outcome(&stats)?;
    info!("Batch dispatch finished");
    Ok(())
}

async fn execute<L, C>(
    cli: &Cli,
    blueprint: &DispatchBlueprint,
    listing: L,
    connector: C,
    collection: &CollectionId,
) -> Result<PipelineStats>
where
    L: ListingClient + Clone,
    C: BrokerConnector,
{
    let mut pipeline = Pipeline::new(blueprint, listing, connector)
        .with_force(cli.force)
        .with_dry_run(cli.dry_run);

    let result = pipeline.run(collection).await;
    debug!(state = ?pipeline.state(), "Pipeline finished");

    result.with_context(|| format!("Dispatch of collection '{collection}' failed"))
}

/// Load configuration and apply CLI overrides
fn load_blueprint(cli: &Cli) -> Result<DispatchBlueprint> {
    let mut blueprint = ConfigLoader::load_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Built-in configuration is invalid".to_string(),
        }
    })?;

    if cli.broker_host.is_none() && cli.broker_port.is_none() {
        return Ok(blueprint);
    }

    if let Some(ref host) = cli.broker_host {
        info!(host = %host, "Overriding broker host from CLI");
        blueprint.broker.host = host.clone();
    }
    if let Some(port) = cli.broker_port {
        info!(port = %port, "Overriding broker port from CLI");
        blueprint.broker.port = port;
    }

    ConfigLoader::validated(blueprint).context("Invalid broker override")
}

/// Turn an unclean run into a non-zero exit
fn check_outcome(stats: &PipelineStats) -> std::result::Result<(), CliError> {
    if stats.is_clean() {
        return Ok(());
    }
    if stats.aborted {
        return Err(CliError::Aborted {
            count: stats.failures,
        });
    }
    Err(CliError::PublishFailures {
        count: stats.failures,
    })
}
