//! Input guardrails that decide whether a user message may reach the model.
//!
//! Layer 1 ([`patterns::PatternGuard`]) is a deterministic, bilingual
//! regular-expression screen and is authoritative whenever it matches.
//! Layer 2 ([`analysis::LlmAnalysisGuard`]) asks an analysis model for a
//! verdict and fails open. [`engine::Guardrails`] runs the layers in order.

#![warn(missing_docs, clippy::pedantic)]

pub mod analysis;
pub mod decision;
pub mod engine;
pub mod patterns;

pub use analysis::{LlmAnalysisGuard, parse_confidence};
pub use decision::{AttackCategory, Confidence, GuardrailVerdict};
pub use engine::{
    FailureMode, GuardLayer, Guardrails, PolicyError, PolicyResult, SAFE_ERROR_MESSAGE,
};
pub use patterns::PatternGuard;
