//! Per-turn state machine for prompt preparation.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// States a turn passes through while its prompt is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Input received, nothing evaluated yet.
    Idle,
    /// Guardrails are inspecting the input.
    Validating,
    /// The prompt type is being resolved.
    Classifying,
    /// The instruction frame is being applied.
    Templating,
    /// Prompt and history are ready for generation.
    Ready,
    /// Guardrails rejected the input; no model call may follow.
    Rejected,
}

impl TurnState {
    /// Returns `true` for [`TurnState::Ready`] and [`TurnState::Rejected`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Rejected)
    }
}

/// Events that drive [`TurnLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// Start validating the input.
    Validate,
    /// Validation passed.
    Accept,
    /// Validation failed.
    Reject,
    /// A prompt type was resolved.
    Classify,
    /// The final prompt was composed.
    Finish,
}

/// Errors emitted by the turn lifecycle.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Transition was not permitted from the current state.
    #[error("invalid turn transition from {from:?} via {event:?}")]
    InvalidTransition {
        /// State prior to the attempted transition.
        from: TurnState,
        /// Event that triggered the failure.
        event: TurnEvent,
    },
}

/// Result alias for lifecycle operations.
pub type TurnResult<T> = Result<T, TurnError>;

/// Turn state tracker that records every visited state.
#[derive(Debug, Clone)]
pub struct TurnLifecycle {
    state: TurnState,
    visited: Vec<TurnState>,
}

impl Default for TurnLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnLifecycle {
    /// Starts a lifecycle in [`TurnState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TurnState::Idle,
            visited: vec![TurnState::Idle],
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// States visited so far, starting with [`TurnState::Idle`].
    #[must_use]
    pub fn visited(&self) -> &[TurnState] {
        &self.visited
    }

    /// Consumes the lifecycle, returning the visited states.
    #[must_use]
    pub fn into_visited(self) -> Vec<TurnState> {
        self.visited
    }

    /// Applies `event`, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::InvalidTransition`] when `event` is not allowed
    /// from the current state.
    pub fn transition(&mut self, event: TurnEvent) -> TurnResult<TurnState> {
        let next = match (self.state, event) {
            (TurnState::Idle, TurnEvent::Validate) => TurnState::Validating,
            // Guardrails disabled: validation is skipped entirely.
            (TurnState::Validating | TurnState::Idle, TurnEvent::Accept) => TurnState::Classifying,
            (TurnState::Validating, TurnEvent::Reject) => TurnState::Rejected,
            (TurnState::Classifying, TurnEvent::Classify) => TurnState::Templating,
            (TurnState::Templating, TurnEvent::Finish) => TurnState::Ready,
            (from, event) => return Err(TurnError::InvalidTransition { from, event }),
        };

        debug!(from = ?self.state, to = ?next, ?event, "turn transition");
        self.state = next;
        self.visited.push(next);
        Ok(next)
    }
}
