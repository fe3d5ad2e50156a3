//! Built-in pricing table for common models.
//!
//! Prices are in USD per 1,000 tokens, with separate input and output rates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Model priced when no explicit model is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Per-1k-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1k input tokens in USD.
    pub input_per_1k: f64,
    /// Price per 1k output tokens in USD.
    pub output_per_1k: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    #[must_use]
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Compute cost for the given token counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cost(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Fixed model → pricing table.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        // Google
        prices.insert(DEFAULT_MODEL.into(), ModelPricing::new(0.000_075, 0.000_3));
        prices.insert(
            "gemini-2.5-flash-lite".into(),
            ModelPricing::new(0.000_1, 0.000_4),
        );
        prices.insert("gemini-2.5-flash".into(), ModelPricing::new(0.000_3, 0.002_5));

        // OpenAI
        prices.insert("gpt-4.1".into(), ModelPricing::new(0.002, 0.008));
        prices.insert("gpt-4.1-mini".into(), ModelPricing::new(0.000_4, 0.001_6));
        prices.insert("gpt-4o-mini".into(), ModelPricing::new(0.000_15, 0.000_6));

        // Local models cost nothing per token.
        prices.insert("gpt-oss:20b".into(), ModelPricing::new(0.0, 0.0));
        prices.insert("offline".into(), ModelPricing::new(0.0, 0.0));

        Self { prices }
    }

    /// Look up pricing for a model.
    #[must_use]
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.prices.get(model).copied()
    }

    /// Pricing of [`DEFAULT_MODEL`], or free when the table lacks it.
    #[must_use]
    pub fn default_pricing(&self) -> ModelPricing {
        self.get(DEFAULT_MODEL)
            .unwrap_or(ModelPricing::new(0.0, 0.0))
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_priced() {
        let table = PricingTable::with_defaults();
        let pricing = table.get(DEFAULT_MODEL).unwrap();
        assert!((pricing.input_per_1k - 0.000_075).abs() < 1e-15);
        assert!((pricing.output_per_1k - 0.000_3).abs() < 1e-15);
    }

    #[test]
    fn cost_scales_per_thousand() {
        let pricing = ModelPricing::new(0.002, 0.008);
        assert!((pricing.cost(500, 0) - 0.001).abs() < 1e-12);
        assert!((pricing.cost(1000, 1000) - 0.010).abs() < 1e-12);
    }

    #[test]
    fn unknown_models_are_not_priced() {
        let table = PricingTable::default();
        assert_eq!(table.get("house-model"), None);
        assert_eq!(table.get("offline"), Some(ModelPricing::new(0.0, 0.0)));
        assert_eq!(
            table.default_pricing(),
            table.get(DEFAULT_MODEL).unwrap()
        );
    }
}
