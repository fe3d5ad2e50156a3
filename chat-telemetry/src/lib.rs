//! Observability utilities: token budgeting, cost accounting, and tracing.

#![warn(missing_docs, clippy::pedantic)]

pub mod pricing;
pub mod tokens;
pub mod tracing_support;
pub mod usage;

pub use pricing::{DEFAULT_MODEL, ModelPricing, PricingTable};
pub use tokens::{TokenEstimator, estimate_tokens};
pub use usage::{SessionSummary, UsageTracker};
