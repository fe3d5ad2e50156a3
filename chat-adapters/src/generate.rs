//! Host-facing generation helpers built on top of [`ModelAdapter`].
//!
//! Two shapes are offered:
//! - [`generate_response`] yields [`Fragment`]s and never fails; an adapter
//!   error becomes one final [`Fragment::Error`].
//! - [`complete`] drains a whole reply and propagates failures so internal
//!   callers can pick their own fallback.

use std::fmt;
use std::pin::Pin;

use chat_primitives::Message;
use futures::{Stream, StreamExt, stream};
use tracing::warn;

use crate::traits::{
    AdapterError, AdapterResult, AdapterStream, GenerationOptions, InferenceRequest, ModelAdapter,
};

/// One piece of a streamed reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Incremental reply text.
    Text(String),
    /// Human-readable generation failure. Always the last fragment.
    Error(String),
}

impl Fragment {
    /// Displayable text of the fragment.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Error(text) => text,
        }
    }

    /// Returns `true` for [`Fragment::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Consumes the fragment, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(text) | Self::Error(text) => text,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazy, finite, non-restartable sequence of reply fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;

/// Prefix of the text carried by [`Fragment::Error`].
pub const ERROR_FRAGMENT_PREFIX: &str = "[generation error]";

fn error_fragment(err: &AdapterError) -> Fragment {
    Fragment::Error(format!(
        "{ERROR_FRAGMENT_PREFIX} could not generate a response: {err}"
    ))
}

/// Sends `prompt` with `history` to the adapter and returns the reply as a
/// fragment stream.
///
/// The caller always receives something displayable: transport failures are
/// reported as a single final [`Fragment::Error`].
pub async fn generate_response(
    adapter: &dyn ModelAdapter,
    prompt: &str,
    history: &[Message],
    options: &GenerationOptions,
) -> FragmentStream {
    let request = InferenceRequest::from_prompt(prompt, history, options);
    match adapter.infer(request).await {
        Ok(inner) => into_fragments(inner),
        Err(err) => {
            let metadata = adapter.metadata();
            warn!(
                provider = metadata.provider(),
                model = metadata.model(),
                error = %err,
                "generation request failed"
            );
            Box::pin(stream::once(async move { error_fragment(&err) }))
        }
    }
}

fn into_fragments(inner: AdapterStream) -> FragmentStream {
    Box::pin(stream::unfold(Some(inner), |state| async move {
        let mut inner = state?;
        loop {
            match inner.next().await {
                Some(Ok(chunk)) => {
                    if chunk.delta.is_empty() {
                        if chunk.done {
                            return None;
                        }
                        continue;
                    }
                    let next = if chunk.done { None } else { Some(inner) };
                    return Some((Fragment::Text(chunk.delta), next));
                }
                Some(Err(err)) => {
                    warn!(error = %err, "generation stream failed mid-reply");
                    return Some((error_fragment(&err), None));
                }
                None => return None,
            }
        }
    }))
}

/// Sends a standalone prompt (no history) and returns the full reply text.
///
/// # Errors
///
/// Propagates any [`AdapterError`] raised when starting or draining the stream.
pub async fn complete(adapter: &dyn ModelAdapter, prompt: &str) -> AdapterResult<String> {
    let request = InferenceRequest::from_prompt(prompt, &[], &GenerationOptions::default());
    let mut inner = adapter.infer(request).await?;

    let mut response = String::new();
    while let Some(chunk) = inner.next().await {
        let chunk = chunk?;
        response.push_str(&chunk.delta);
        if chunk.done {
            break;
        }
    }

    Ok(response)
}
