//! Model adapters used by the conversation governance layer.
//!
//! Concrete vendor transports live outside this workspace; they plug in by
//! implementing [`traits::ModelAdapter`]. The [`generate`] module turns an
//! adapter into the host-facing fragment stream, and [`scripted`] provides an
//! offline adapter for demos and tests.

#![warn(missing_docs, clippy::pedantic)]

pub mod generate;
pub mod scripted;
pub mod traits;

pub use generate::{ERROR_FRAGMENT_PREFIX, Fragment, FragmentStream, complete, generate_response};
pub use scripted::ScriptedAdapter;
pub use traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, GenerationOptions,
    InferenceChunk, InferenceRequest, ModelAdapter,
};
