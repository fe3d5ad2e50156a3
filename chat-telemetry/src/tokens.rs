//! Token estimation.
//!
//! Uses a word-based heuristic: `round(words * 1.3)` over whitespace-split
//! words. Cheap and vendor-agnostic; it is not a tokenizer.

use chat_primitives::Message;
use tracing::warn;

use crate::pricing::{DEFAULT_MODEL, ModelPricing, PricingTable};

const TOKENS_PER_WORD: f64 = 1.3;

/// Estimate the token count for a string. Empty text yields 0.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).round() as usize
}

/// Token counter and cost calculator bound to one model's pricing.
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    model: String,
    pricing: ModelPricing,
}

impl TokenEstimator {
    /// Creates an estimator for `model` using the built-in pricing table.
    ///
    /// Unknown models are priced like [`DEFAULT_MODEL`].
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let table = PricingTable::with_defaults();
        let pricing = table.get(&model).unwrap_or_else(|| {
            warn!(model = %model, fallback = DEFAULT_MODEL, "no pricing for model");
            table.default_pricing()
        });
        Self { model, pricing }
    }

    /// Creates an estimator with explicit pricing.
    #[must_use]
    pub fn with_pricing(model: impl Into<String>, pricing: ModelPricing) -> Self {
        Self {
            model: model.into(),
            pricing,
        }
    }

    /// Returns the model this estimator prices.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the active pricing.
    #[must_use]
    pub const fn pricing(&self) -> ModelPricing {
        self.pricing
    }

    /// Approximate token count of `text`.
    #[must_use]
    pub fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Sum of token estimates over every message text.
    #[must_use]
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| estimate_tokens(m.text())).sum()
    }

    /// Cost in USD of a request with the given token counts.
    #[must_use]
    pub fn calculate_cost(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        self.pricing.cost(input_tokens, output_tokens)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
