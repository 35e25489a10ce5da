//! Dispatcher - publishes part files to the work and log queues

use std::sync::Arc;

use contracts::{
    AuditRecord, BrokerConnector, ContractError, DispatchBlueprint, MessageBroker, PartFile,
    PublishErrorPolicy, QueueSpec, WorkItem,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Queue receiving raw part-file identifiers
    pub work_queue: QueueSpec,
    /// Queue receiving audit records
    pub log_queue: QueueSpec,
    /// First field of every audit record
    pub source_tag: String,
    pub on_publish_error: PublishErrorPolicy,
}

impl DispatcherConfig {
    pub fn from_blueprint(blueprint: &DispatchBlueprint) -> Self {
        Self {
            work_queue: blueprint.queues.work_spec(),
            log_queue: blueprint.queues.log_spec(),
            source_tag: blueprint.dispatch.source_tag.clone(),
            on_publish_error: blueprint.dispatch.on_publish_error,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from_blueprint(&DispatchBlueprint::default())
    }
}

/// Which of the two messages of a work item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Audit,
    Work,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audit => write!(f, "audit"),
            Self::Work => write!(f, "work"),
        }
    }
}

/// A single rejected publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
    pub kind: MessageKind,
    pub queue: String,
    /// Part file the message belonged to
    pub payload: String,
    pub message: String,
}

/// Outcome of one dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Work items for which publishing was attempted
    pub attempted: usize,
    pub work_published: usize,
    pub audit_published: usize,
    pub failures: Vec<PublishFailure>,
    /// Run stopped early under `PublishErrorPolicy::Abort`
    pub aborted: bool,
}

impl DispatchReport {
    /// Every attempted message was accepted and nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }
}

/// Publishes one audit message and one work message per part file
///
/// Opens exactly one connection per `dispatch` call and always closes it,
/// on success and on every error path after the connection was opened.
pub struct Dispatcher<C: BrokerConnector> {
    connector: C,
    config: DispatcherConfig,
    metrics: Arc<DispatchMetrics>,
}

impl<C: BrokerConnector> Dispatcher<C> {
    pub fn new(connector: C, config: DispatcherConfig) -> Self {
        Self {
            connector,
            config,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Get dispatcher metrics
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Publish every part file, in order
    ///
    /// Publish failures are collected into the report. Connection failures
    /// (at connect time or lost mid-run) and declaration failures are
    /// returned as errors.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, part_files),
        fields(endpoint = %self.connector.endpoint(), items = part_files.len())
    )]
    pub async fn dispatch(&self, part_files: &[PartFile]) -> Result<DispatchReport, DispatcherError> {
        let mut broker = self
            .connector
            .connect()
            .await
            .map_err(|e| DispatcherError::broker_connection(self.connector.endpoint(), e))?;
        self.metrics.inc_connect_count();
        debug!(broker = %broker.name(), "Broker connected");

        let result = self.run_with(&mut broker, part_files).await;

        if let Err(e) = broker.close().await {
            warn!(error = %e, "Broker close failed");
        }

        if let Ok(report) = &result {
            info!(
                attempted = report.attempted,
                work_published = report.work_published,
                audit_published = report.audit_published,
                failures = report.failures.len(),
                aborted = report.aborted,
                "Dispatch finished"
            );
        }
        result
    }

    async fn run_with(
        &self,
        broker: &mut C::Broker,
        part_files: &[PartFile],
    ) -> Result<DispatchReport, DispatcherError> {
        for queue in [&self.config.log_queue, &self.config.work_queue] {
            broker
                .declare_queue(queue)
                .await
                .map_err(|e| DispatcherError::declare(&queue.name, e))?;
            debug!(queue = %queue.name, durable = queue.durable, "Queue declared");
        }

        let mut report = DispatchReport::default();

        for part_file in part_files {
            report.attempted += 1;
            let failures_before = report.failures.len();

            let audit = AuditRecord::now(&self.config.source_tag, part_file).encode();
            match broker.publish(&self.config.log_queue.name, audit).await {
                Ok(()) => {
                    report.audit_published += 1;
                    self.metrics.inc_audit_published();
                }
                Err(e) => self.publish_failed(&mut report, MessageKind::Audit, part_file, e)?,
            }

            let work = WorkItem::new(part_file.clone()).encode();
            match broker.publish(&self.config.work_queue.name, work).await {
                Ok(()) => {
                    report.work_published += 1;
                    self.metrics.inc_work_published();
                }
                Err(e) => self.publish_failed(&mut report, MessageKind::Work, part_file, e)?,
            }

            let item_failed = report.failures.len() > failures_before;
            if item_failed && self.config.on_publish_error == PublishErrorPolicy::Abort {
                error!(part_file = %part_file, "Publish failed, aborting remaining items");
                report.aborted = true;
                break;
            }
        }

        Ok(report)
    }

    /// A lost connection ends the run; any other rejection is recorded
    fn publish_failed(
        &self,
        report: &mut DispatchReport,
        kind: MessageKind,
        part_file: &PartFile,
        error: ContractError,
    ) -> Result<(), DispatcherError> {
        if matches!(error, ContractError::BrokerConnection { .. }) {
            error!(
                %kind,
                part_file = %part_file,
                published = report.work_published,
                error = %error,
                "Broker connection lost"
            );
            self.metrics.inc_failure_count();
            return Err(DispatcherError::broker_connection(
                self.connector.endpoint(),
                error,
            ));
        }
        self.record_failure(report, kind, part_file, error);
        Ok(())
    }

    fn record_failure(
        &self,
        report: &mut DispatchReport,
        kind: MessageKind,
        part_file: &PartFile,
        error: ContractError,
    ) {
        let queue = match kind {
            MessageKind::Audit => &self.config.log_queue.name,
            MessageKind::Work => &self.config.work_queue.name,
        };
        warn!(%kind, %queue, part_file = %part_file, error = %error, "Publish failed");

        self.metrics.inc_failure_count();
        report.failures.push(PublishFailure {
            kind,
            queue: queue.clone(),
            payload: part_file.as_str().to_string(),
            message: error.to_string(),
        });
    }
}
