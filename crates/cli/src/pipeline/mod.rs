//! Pipeline orchestration module.

mod orchestrator;
mod state;
mod stats;

pub use orchestrator::Pipeline;
pub use state::{PipelineState, StateMachine};
pub use stats::PipelineStats;
