//! Guardrail layer trait and the ordered layer runner.

use std::sync::Arc;

use async_trait::async_trait;
use chat_adapters::ModelAdapter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::LlmAnalysisGuard;
use crate::decision::GuardrailVerdict;
use crate::patterns::PatternGuard;

/// Errors surfaced by guardrail layers.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A detection pattern failed to compile.
    #[error("invalid guardrail pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler error message.
        reason: String,
    },
    /// The analysis backend failed to produce a verdict.
    #[error("guardrail backend failure: {reason}")]
    Backend {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
}

/// Result alias for guardrail operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// What the runner does when a layer returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Treat the failure as "no attack detected" and keep going.
    FailOpen,
    /// Reject the input.
    FailClosed,
}

/// One stage of input validation.
#[async_trait]
pub trait GuardLayer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Policy applied when [`GuardLayer::inspect`] fails.
    fn failure_mode(&self) -> FailureMode {
        FailureMode::FailClosed
    }

    /// Inspects `input`, returning an accepting or rejecting verdict.
    async fn inspect(&self, input: &str) -> PolicyResult<GuardrailVerdict>;
}

/// Message shown to users whenever a turn is rejected. It never echoes the
/// detected pattern or the analysis model's reasoning.
pub const SAFE_ERROR_MESSAGE: &str = "Sorry, I can't process that request.\n\n\
Please rephrase your question so it focuses on software development.\n\n\
I can help with:\n\
- Programming concepts\n\
- Code review\n\
- Debugging\n\
- Best practices\n\
- Software architecture";

/// Ordered set of guardrail layers. The first rejection wins.
pub struct Guardrails {
    layers: Vec<Arc<dyn GuardLayer>>,
}

impl std::fmt::Debug for Guardrails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.layers.iter().map(|l| l.name()).collect();
        f.debug_struct("Guardrails").field("layers", &names).finish()
    }
}

impl Guardrails {
    /// Creates guardrails with only the pattern layer.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] if a built-in pattern fails to
    /// compile.
    pub fn new() -> PolicyResult<Self> {
        Ok(Self::empty().with_layer(Arc::new(PatternGuard::new()?)))
    }

    /// Creates guardrails with no layers; every input is accepted.
    #[must_use]
    pub fn empty() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends a layer after the existing ones.
    #[must_use]
    pub fn with_layer(mut self, layer: Arc<dyn GuardLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Appends the model-assisted analysis layer backed by `adapter`.
    #[must_use]
    pub fn with_analysis(self, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.with_layer(Arc::new(LlmAnalysisGuard::new(adapter)))
    }

    /// Number of configured layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Generic message to show the user after a rejection.
    #[must_use]
    pub fn safe_error_message(&self) -> &'static str {
        SAFE_ERROR_MESSAGE
    }

    /// Runs every layer in order, stopping at the first rejection.
    pub async fn validate(&self, input: &str) -> GuardrailVerdict {
        for layer in &self.layers {
            match layer.inspect(input).await {
                Ok(verdict) if verdict.is_accepted() => {
                    debug!(layer = layer.name(), "guardrail layer passed");
                }
                Ok(verdict) => {
                    warn!(
                        layer = layer.name(),
                        category = ?verdict.category(),
                        reason = verdict.reason().unwrap_or_default(),
                        "guardrail rejected input"
                    );
                    return verdict;
                }
                Err(err) => match layer.failure_mode() {
                    FailureMode::FailOpen => {
                        warn!(layer = layer.name(), error = %err, "guardrail layer failed open");
                    }
                    FailureMode::FailClosed => {
                        warn!(layer = layer.name(), error = %err, "guardrail layer failed closed");
                        return GuardrailVerdict::reject_with(
                            crate::decision::AttackCategory::Analysis,
                            format!("guardrail layer `{}` unavailable: {err}", layer.name()),
                        );
                    }
                },
            }
        }

        GuardrailVerdict::accept()
    }
}
