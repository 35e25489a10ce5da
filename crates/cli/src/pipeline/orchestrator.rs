//! Pipeline orchestrator - locate, enumerate, dispatch.
//!
//! Generic over the listing backend and the broker connector, so the same
//! flow runs against HDFS + RabbitMQ, a local directory, dry-run logging or
//! in-memory fakes.

use std::path::PathBuf;
use std::time::Instant;

use contracts::{BrokerConnector, CollectionId, DispatchBlueprint, ListingClient};
use discovery::{PartFileEnumerator, PartitionLocator};
use dispatcher::{DispatchLedger, DispatchReport, Dispatcher, DispatcherConfig, MessageKind};
use tracing::{info, instrument, warn};

use super::{PipelineState, PipelineStats, StateMachine};
use crate::error::{CliError, Result};

/// Main pipeline orchestrator
pub struct Pipeline<L, C: BrokerConnector> {
    locator: PartitionLocator<L>,
    enumerator: PartFileEnumerator<L>,
    dispatcher: Dispatcher<C>,
    ledger_path: Option<PathBuf>,
    force: bool,
    dry_run: bool,
    state: StateMachine,
}

impl<L, C> Pipeline<L, C>
where
    L: ListingClient + Clone,
    C: BrokerConnector,
{
    /// Create a new pipeline from configuration
    pub fn new(blueprint: &DispatchBlueprint, listing: L, connector: C) -> Self {
        Self {
            locator: PartitionLocator::new(listing.clone(), &blueprint.storage),
            enumerator: PartFileEnumerator::new(listing, &blueprint.storage),
            dispatcher: Dispatcher::new(connector, DispatcherConfig::from_blueprint(blueprint)),
            ledger_path: blueprint.dispatch.ledger_path.clone(),
            force: false,
            dry_run: false,
            state: StateMachine::default(),
        }
    }

    /// Ignore the ledger when checking for an earlier dispatch
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Mark the run as dry (connector only logs); the ledger is not updated
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state.state()
    }

    /// Run the pipeline to completion
    ///
    /// Publish failures do not fail the run; they are reported in the stats.
    #[instrument(name = "pipeline_run", skip(self), fields(collection = %collection))]
    pub async fn run(&mut self, collection: &CollectionId) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let mut stats = PipelineStats::new(collection.as_str());
        stats.dry_run = self.dry_run;

        let result = self.drive(collection, &mut stats).await;
        if let Err(CliError::Contract(e)) = &result {
            if e.is_discovery() {
                warn!(error = %e, "Discovery failed, broker not contacted");
            }
        }

        self.state.close();
        stats.state = self.state.state();
        stats.duration = start_time.elapsed();
        observability::record_run_duration_ms(stats.duration.as_secs_f64() * 1000.0);

        result.map(|()| stats)
    }

    async fn drive(&mut self, collection: &CollectionId, stats: &mut PipelineStats) -> Result<()> {
        // 1. Locate
        let partition = self.locator.locate(collection).await?;
        self.state.advance(PipelineState::Located)?;
        observability::record_partition_located(collection.as_str());
        stats.partition = Some(partition.name.clone());
        info!(partition = %partition.name, path = %partition.path, "Latest partition located");

        // 2. Ledger check
        let mut ledger = self
            .ledger_path
            .as_deref()
            .map(DispatchLedger::open)
            .transpose()?;

        if let Some(ledger) = &ledger {
            if ledger.contains(collection, &partition) {
                if self.force {
                    warn!(partition = %partition.name, "Partition already dispatched, forcing");
                } else {
                    info!(partition = %partition.name, "Partition already dispatched, skipping");
                    stats.skipped_by_ledger = true;
                    return Ok(());
                }
            }
        }

        // 3. Enumerate
        let part_files = self.enumerator.enumerate(&partition).await?;
        self.state.advance(PipelineState::Enumerated)?;
        observability::record_part_files(part_files.len());
        stats.part_files = part_files.len();
        info!(part_files = part_files.len(), "Part files enumerated");

        // 4. Dispatch
        self.state.advance(PipelineState::Dispatching)?;
        let report = self.dispatcher.dispatch(&part_files).await?;
        self.record_report(&report, stats);

        // 5. Ledger update, clean real runs only
        if let Some(ledger) = ledger.as_mut() {
            if report.is_clean() && !self.dry_run {
                ledger.record(collection, &partition, part_files.len());
                ledger.save()?;
            }
        }

        Ok(())
    }

    fn record_report(&self, report: &DispatchReport, stats: &mut PipelineStats) {
        let config = self.dispatcher.config();
        observability::record_messages_published(&config.log_queue.name, report.audit_published);
        observability::record_messages_published(&config.work_queue.name, report.work_published);
        for failure in &report.failures {
            observability::record_publish_failure(&failure.queue);
        }

        let work_failures = report
            .failures
            .iter()
            .filter(|f| f.kind == MessageKind::Work)
            .count();
        if work_failures > 0 {
            warn!(work_failures, "Some part files did not reach the work queue");
        }

        stats.attempted = report.attempted;
        stats.work_published = report.work_published;
        stats.audit_published = report.audit_published;
        stats.failures = report.failures.len();
        stats.aborted = report.aborted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, PublishErrorPolicy};
    use discovery::InMemoryListing;
    use dispatcher::InMemoryBroker;

    fn blueprint() -> DispatchBlueprint {
        let mut blueprint = DispatchBlueprint::default();
        blueprint.storage.output_root_template = "/out/{}".into();
        blueprint
    }

    fn listing() -> InMemoryListing {
        InMemoryListing::new()
            .with_entries("/out/foo", ["2019-12-31", "2020-01-01", "2020-02-15"])
            .with_entries(
                "/out/foo/2020-02-15",
                ["part-00000", "_SUCCESS", "part-00001"],
            )
    }

    fn collection() -> CollectionId {
        CollectionId::new("foo").unwrap()
    }

    #[tokio::test]
    async fn test_latest_partition_is_dispatched() {
        let broker = InMemoryBroker::new();
        let mut pipeline = Pipeline::new(&blueprint(), listing(), broker.clone());

        let stats = pipeline.run(&collection()).await.unwrap();

        assert_eq!(stats.partition.as_deref(), Some("2020-02-15"));
        assert_eq!(stats.part_files, 2);
        assert_eq!(stats.work_published, 2);
        assert_eq!(stats.audit_published, 2);
        assert!(stats.is_clean());
        assert_eq!(stats.state, PipelineState::Closed);
        assert_eq!(pipeline.state(), PipelineState::Closed);
        assert_eq!(broker.messages_utf8("nsfw"), vec!["part-00000", "part-00001"]);
    }

    #[tokio::test]
    async fn test_no_partitions_never_connects() {
        let listing = InMemoryListing::new().with_entries("/out/foo", Vec::<String>::new());
        let broker = InMemoryBroker::new();
        let mut pipeline = Pipeline::new(&blueprint(), listing, broker.clone());

        let err = pipeline.run(&collection()).await.unwrap_err();

        assert!(matches!(
            err,
            CliError::Contract(ContractError::NoPartitionsFound { .. })
        ));
        assert_eq!(broker.connect_attempts(), 0);
        assert_eq!(pipeline.state(), PipelineState::Closed);
    }

    #[tokio::test]
    async fn test_enumeration_failure_never_connects() {
        let listing = InMemoryListing::new()
            .with_entries("/out/foo", ["2020-02-15"])
            .with_failure("/out/foo/2020-02-15", "permission denied");
        let broker = InMemoryBroker::new();
        let mut pipeline = Pipeline::new(&blueprint(), listing, broker.clone());

        let err = pipeline.run(&collection()).await.unwrap_err();

        assert!(matches!(err, CliError::Contract(ContractError::Listing { .. })));
        assert_eq!(broker.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_empty_partition_dispatches_nothing() {
        let listing = InMemoryListing::new()
            .with_entries("/out/foo", ["2020-02-15"])
            .with_entries("/out/foo/2020-02-15", ["_SUCCESS"]);
        let broker = InMemoryBroker::new();
        let mut pipeline = Pipeline::new(&blueprint(), listing, broker.clone());

        let stats = pipeline.run(&collection()).await.unwrap();

        assert_eq!(stats.part_files, 0);
        assert_eq!(stats.work_published, 0);
        assert!(broker.messages("nsfw").is_empty());
        assert_eq!(broker.close_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_failures_are_reported_not_raised() {
        let broker = InMemoryBroker::new().with_publish_failure("nsfw", "part-00000");
        let mut pipeline = Pipeline::new(&blueprint(), listing(), broker.clone());

        let stats = pipeline.run(&collection()).await.unwrap();

        assert!(!stats.is_clean());
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.work_published, 1);
    }

    #[tokio::test]
    async fn test_abort_policy_is_reported() {
        let mut bp = blueprint();
        bp.dispatch.on_publish_error = PublishErrorPolicy::Abort;
        let broker = InMemoryBroker::new().with_publish_failure("log", "");
        let mut pipeline = Pipeline::new(&bp, listing(), broker.clone());

        let stats = pipeline.run(&collection()).await.unwrap();

        assert!(stats.aborted);
        assert_eq!(stats.attempted, 1);
        assert_eq!(broker.close_count(), 1);
    }

    #[tokio::test]
    async fn test_ledger_skips_second_run_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let mut bp = blueprint();
        bp.dispatch.ledger_path = Some(dir.path().join("ledger.json"));
        let broker = InMemoryBroker::new();

        let first = Pipeline::new(&bp, listing(), broker.clone())
            .run(&collection())
            .await
            .unwrap();
        assert!(!first.skipped_by_ledger);
        assert_eq!(broker.connect_attempts(), 1);

        let mut second = Pipeline::new(&bp, listing(), broker.clone());
        let stats = second.run(&collection()).await.unwrap();
        assert!(stats.skipped_by_ledger);
        assert_eq!(stats.work_published, 0);
        assert_eq!(broker.connect_attempts(), 1);
        assert_eq!(second.state(), PipelineState::Closed);

        let forced = Pipeline::new(&bp, listing(), broker.clone())
            .with_force(true)
            .run(&collection())
            .await
            .unwrap();
        assert_eq!(forced.work_published, 2);
        assert_eq!(broker.connect_attempts(), 2);
        assert_eq!(broker.messages("nsfw").len(), 4);
    }

    #[tokio::test]
    async fn test_failed_run_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let mut bp = blueprint();
        bp.dispatch.ledger_path = Some(ledger_path.clone());

        let failing = InMemoryBroker::new().with_publish_failure("nsfw", "part-00001");
        let stats = Pipeline::new(&bp, listing(), failing)
            .run(&collection())
            .await
            .unwrap();
        assert!(!stats.is_clean());

        let ledger = DispatchLedger::open(&ledger_path).unwrap();
        let partition = contracts::Partition::from_entry("/out/foo", "2020-02-15");
        assert!(!ledger.contains(&collection(), &partition));
    }

    #[tokio::test]
    async fn test_dry_run_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let mut bp = blueprint();
        bp.dispatch.ledger_path = Some(ledger_path.clone());

        let stats = Pipeline::new(&bp, listing(), dispatcher::LogConnector::new("dry-run"))
            .with_dry_run(true)
            .run(&collection())
            .await
            .unwrap();
        assert!(stats.dry_run);
        assert_eq!(stats.work_published, 2);
        assert!(!ledger_path.exists());
    }
}
