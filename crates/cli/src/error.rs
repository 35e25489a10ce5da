//! Error types for CLI operations.

use contracts::ContractError;
use dispatcher::DispatcherError;
use thiserror::Error;

use crate::pipeline::PipelineState;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration, discovery or ledger failure
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Broker connection or queue declaration failure
    #[error(transparent)]
    Dispatch(#[from] DispatcherError),

    /// Some messages were rejected by the broker
    #[error("{count} publish(es) failed")]
    PublishFailures { count: usize },

    /// The run stopped early under the abort policy
    #[error("dispatch aborted after a publish failure ({count} failure(s))")]
    Aborted { count: usize },

    /// The pipeline state machine was driven out of order
    #[error("illegal pipeline transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

impl CliError {
    pub fn illegal_transition(from: PipelineState, to: PipelineState) -> Self {
        Self::IllegalTransition { from, to }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
