//! Pipeline lifecycle state machine.

use serde::Serialize;

use crate::error::{CliError, Result};

/// Lifecycle of a single dispatch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing done yet
    Idle,
    /// Latest partition selected
    Located,
    /// Part files listed
    Enumerated,
    /// Broker connection open, publishing
    Dispatching,
    /// Run finished, successfully or not
    Closed,
}

impl PipelineState {
    /// Returns true if this is the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Validates a state transition.
    ///
    /// Every non-terminal state may close early (failure or ledger skip).
    #[must_use]
    pub fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (Self::Idle, Self::Located)
                | (Self::Located, Self::Enumerated)
                | (Self::Enumerated, Self::Dispatching)
                | (
                    Self::Idle | Self::Located | Self::Enumerated | Self::Dispatching,
                    Self::Closed
                )
        )
    }
}

/// Tracks the current state and rejects out-of-order transitions
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PipelineState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }
}

impl StateMachine {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `to`, or fail leaving the state unchanged
    pub fn advance(&mut self, to: PipelineState) -> Result<()> {
        if !PipelineState::is_valid_transition(self.state, to) {
            return Err(CliError::illegal_transition(self.state, to));
        }
        tracing::debug!(from = ?self.state, to = ?to, "Pipeline state changed");
        self.state = to;
        Ok(())
    }

    /// Close from wherever the run stopped; no-op once closed
    pub fn close(&mut self) {
        if !self.state.is_terminal() {
            self.state = PipelineState::Closed;
        }
    }
}
