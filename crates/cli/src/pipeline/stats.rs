//! Pipeline statistics and run summary.

use std::time::Duration;

use serde::Serialize;

use super::PipelineState;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub collection: String,

    /// Selected partition (None when location failed)
    pub partition: Option<String>,

    /// Part files found in the partition
    pub part_files: usize,

    /// Work items for which publishing was attempted
    pub attempted: usize,

    pub work_published: usize,
    pub audit_published: usize,

    /// Rejected publishes on either queue
    pub failures: usize,

    /// Stopped early under the abort policy
    pub aborted: bool,

    /// Partition already recorded in the ledger, nothing dispatched
    pub skipped_by_ledger: bool,

    /// Messages went to the log broker only
    pub dry_run: bool,

    /// Final pipeline state
    pub state: PipelineState,

    /// Total duration of the pipeline run
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

impl PipelineStats {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            partition: None,
            part_files: 0,
            attempted: 0,
            work_published: 0,
            audit_published: 0,
            failures: 0,
            aborted: false,
            skipped_by_ledger: false,
            dry_run: false,
            state: PipelineState::Idle,
            duration: Duration::ZERO,
        }
    }

    /// No failures and nothing skipped by the abort policy
    pub fn is_clean(&self) -> bool {
        self.failures == 0 && !self.aborted
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Dispatch Summary ===\n");
        println!("Collection: {}", self.collection);
        println!(
            "Partition:  {}",
            self.partition.as_deref().unwrap_or("(none)")
        );
        println!("Duration:   {:.2}s", self.duration.as_secs_f64());

        if self.skipped_by_ledger {
            println!("\nPartition already dispatched (ledger), nothing sent. Use --force to resend.");
            println!();
            return;
        }

        println!("\nPart files: {}", self.part_files);
        println!("  Work messages:  {}", self.work_published);
        println!("  Audit messages: {}", self.audit_published);
        if self.failures > 0 {
            println!("  Failures:       {}", self.failures);
        }
        if self.aborted {
            println!(
                "  Aborted after {} of {} part files",
                self.attempted, self.part_files
            );
        }
        if self.dry_run {
            println!("\n(dry run: messages were logged, not published)");
        }
        println!();
    }
}
