//! Model-assisted intent detection.

use std::sync::Arc;

use chat_adapters::{AdapterError, ModelAdapter, complete};
use chat_primitives::PromptType;
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a classification attempt produced no usable type.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The classifier model call failed.
    #[error("classifier call failed: {0}")]
    Backend(#[from] AdapterError),
    /// The reply did not name a known prompt type.
    #[error("classifier replied with unknown category `{reply}`")]
    Unrecognized {
        /// Trimmed classifier reply.
        reply: String,
    },
}

/// Builds the classification instruction for `input`.
#[must_use]
pub fn classification_prompt(input: &str) -> String {
    format!(
        "You classify questions sent to a software development assistant.

Decide which category the user's query belongs to.

**Available categories:**

1. **general** - general software development questions
2. **code_review** - requests to review, analyze or improve code
3. **explanation** - questions about concepts, definitions or how something works
4. **debugging** - problems, errors or bugs that need a fix
5. **best_practices** - best practices, standards or conventions
6. **architecture** - system design, architectural patterns, structure
7. **learning** - learning guides, roadmaps or tutorials

Reply with the category name only.

**User query**
{input}

**Category:**"
    )
}

/// Detects the [`PromptType`] of a query.
///
/// Without a classifier model every query is [`PromptType::General`].
#[derive(Clone, Default)]
pub struct PromptClassifier {
    adapter: Option<Arc<dyn ModelAdapter>>,
}

impl std::fmt::Debug for PromptClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptClassifier")
            .field("adapter", &self.adapter.as_ref().map(|a| a.metadata()))
            .finish()
    }
}

impl PromptClassifier {
    /// Classifier that always answers [`PromptType::General`].
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Classifier backed by `adapter`.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter: Some(adapter),
        }
    }

    /// Returns `true` when a classifier model is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.adapter.is_some()
    }

    /// Asks the classifier model for a type.
    ///
    /// Returns `Ok(PromptType::General)` when no model is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Backend`] when the call fails and
    /// [`ClassifyError::Unrecognized`] when the trimmed, lower-cased reply is
    /// not exactly one of the type names.
    pub async fn classify(&self, input: &str) -> Result<PromptType, ClassifyError> {
        let Some(adapter) = &self.adapter else {
            return Ok(PromptType::General);
        };

        let reply = complete(adapter.as_ref(), &classification_prompt(input)).await?;
        let reply = reply.trim().to_lowercase();
        reply
            .parse::<PromptType>()
            .map_err(|_| ClassifyError::Unrecognized { reply })
    }

    /// Detects the type of `input`, degrading to [`PromptType::General`] on
    /// any failure.
    pub async fn detect_prompt_type(&self, input: &str) -> PromptType {
        match self.classify(input).await {
            Ok(kind) => {
                debug!(prompt_type = %kind, "prompt type detected");
                kind
            }
            Err(err) => {
                warn!(error = %err, "classification degraded to general");
                PromptType::General
            }
        }
    }
}
