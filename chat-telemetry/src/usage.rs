//! Session-level usage accounting.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::tokens::TokenEstimator;

/// Accumulates token and cost totals for one session.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    estimator: TokenEstimator,
    input_tokens: usize,
    output_tokens: usize,
    requests: usize,
    total_cost: f64,
    started: Instant,
}

/// Snapshot returned by [`UsageTracker::session_summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Input plus output tokens.
    pub total_tokens: usize,
    /// Tokens sent to the model.
    pub input_tokens: usize,
    /// Tokens received from the model.
    pub output_tokens: usize,
    /// Number of tracked requests.
    pub total_requests: usize,
    /// Accumulated cost in USD.
    pub total_cost: f64,
    /// Mean tokens per request.
    pub average_tokens_per_request: f64,
    /// Time since the tracker was created.
    pub session_duration: Duration,
}

impl UsageTracker {
    /// Creates a tracker that prices usage with `estimator`.
    #[must_use]
    pub fn new(estimator: TokenEstimator) -> Self {
        Self {
            estimator,
            input_tokens: 0,
            output_tokens: 0,
            requests: 0,
            total_cost: 0.0,
            started: Instant::now(),
        }
    }

    /// Returns the estimator used for pricing.
    #[must_use]
    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Records one request.
    pub fn track_usage(&mut self, input_tokens: usize, output_tokens: usize) {
        self.total_cost += self.estimator.calculate_cost(input_tokens, output_tokens);
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.requests += 1;
    }

    /// Summarises usage since the tracker was created.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn session_summary(&self) -> SessionSummary {
        let total_tokens = self.input_tokens + self.output_tokens;
        SessionSummary {
            total_tokens,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            total_requests: self.requests,
            total_cost: self.total_cost,
            average_tokens_per_request: total_tokens as f64 / self.requests.max(1) as f64,
            session_duration: self.started.elapsed(),
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(TokenEstimator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::ModelPricing;

    #[test]
    fn empty_session_has_zero_average() {
        let summary = UsageTracker::default().session_summary();
        assert_eq!(summary.total_requests, 0);
        assert!(summary.average_tokens_per_request.abs() < f64::EPSILON);
    }

    #[test]
    fn accumulates_requests() {
        let estimator = TokenEstimator::with_pricing("test", ModelPricing::new(1.0, 2.0));
        let mut tracker = UsageTracker::new(estimator);
        tracker.track_usage(1000, 500);
        tracker.track_usage(500, 0);

        let summary = tracker.session_summary();
        assert_eq!(summary.input_tokens, 1500);
        assert_eq!(summary.output_tokens, 500);
        assert_eq!(summary.total_tokens, 2000);
        assert_eq!(summary.total_requests, 2);
        assert!((summary.total_cost - 2.5).abs() < 1e-12);
        assert!((summary.average_tokens_per_request - 1000.0).abs() < 1e-12);
    }
}
