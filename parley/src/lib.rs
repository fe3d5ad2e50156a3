//! Conversation governance for LLM chat applications.
//!
//! Depend on this crate via `cargo add parley`. It bundles the workspace
//! crates behind feature flags so hosts can pull in only the pieces they use,
//! for example the guardrails without the session runtime.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use chat_primitives as primitives;

/// Per-conversation session runtime (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use chat_kernel as kernel;

/// Model collaborator contract and fragment streams (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use chat_adapters as adapters;

/// Conversation storage (enabled by `memory` feature).
#[cfg(feature = "memory")]
pub use chat_memory as memory;

/// Input guardrails (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use chat_policy as policy;

/// Token accounting and tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use chat_telemetry as telemetry;

/// Context strategies, templates and prompt orchestration (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use chat_prompts as prompts;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use chat_config as config;
