//! Offline adapter that answers from a fixed script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream;

use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    ModelAdapter,
};

#[derive(Debug)]
enum Script {
    Replies(Mutex<VecDeque<String>>),
    Echo,
    Fail(String),
}

/// Adapter that replays scripted replies word by word.
///
/// Replies are consumed in order; the final reply repeats once the script is
/// exhausted. Every request is recorded for later inspection.
#[derive(Debug)]
pub struct ScriptedAdapter {
    metadata: AdapterMetadata,
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedAdapter {
    /// Creates an adapter that answers with `replies` in order.
    #[must_use]
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies = replies.into_iter().map(Into::into).collect();
        Self::with_script(Script::Replies(Mutex::new(replies)))
    }

    /// Creates an adapter that answers with the last paragraph of each prompt.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Creates an adapter whose every request fails with a transport error.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(reason.into()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            metadata: AdapterMetadata::new("scripted", "offline"),
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of inference requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self, request: &InferenceRequest) -> AdapterResult<String> {
        match &self.script {
            Script::Replies(queue) => {
                let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
                let reply = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(reply.unwrap_or_default())
            }
            Script::Echo => {
                let prompt = request.prompt().unwrap_or_default();
                let last = prompt.rsplit("\n\n").next().unwrap_or(prompt);
                Ok(last.trim().to_owned())
            }
            Script::Fail(reason) => Err(AdapterError::transport(reason.clone())),
        }
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.next_reply(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let reply = reply?;
        let words: Vec<&str> = reply.split_inclusive(' ').collect();
        let last = words.len().saturating_sub(1);
        let chunks: Vec<AdapterResult<InferenceChunk>> = if words.is_empty() {
            vec![Ok(InferenceChunk::new("", true))]
        } else {
            words
                .iter()
                .enumerate()
                .map(|(idx, word)| Ok(InferenceChunk::new(*word, idx == last)))
                .collect()
        };

        Ok(Box::pin(stream::iter(chunks)))
    }
}
