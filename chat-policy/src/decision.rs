//! Verdict types returned by guardrail layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Family of attack a rejection was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    /// Attempt to replace the assistant's role ("you are now ...").
    RoleChange,
    /// Attempt to void prior instructions ("ignore all previous instructions").
    Jailbreak,
    /// Attempt to extract the system prompt.
    PromptLeak,
    /// Flagged by the model-assisted analysis layer.
    Analysis,
}

impl AttackCategory {
    /// Category-specific warning used in logs and verdict reasons.
    #[must_use]
    pub const fn warning(self) -> &'static str {
        match self {
            Self::RoleChange => "attempt to change the assistant's role detected",
            Self::Jailbreak => "jailbreak attempt detected",
            Self::PromptLeak => "attempt to extract the system prompt detected",
            Self::Analysis => "input flagged by security analysis",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RoleChange => "role_change",
            Self::Jailbreak => "jailbreak",
            Self::PromptLeak => "prompt_leak",
            Self::Analysis => "analysis",
        })
    }
}

/// Confidence that an input is an attack, as reported by the analysis layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Safe, or nothing conclusive.
    Low,
    /// Suspicious.
    Medium,
    /// Attack.
    High,
}

impl Confidence {
    /// `true` for the levels that reject a turn.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Medium | Self::High)
    }
}

/// Structured outcome of running input through one or more guardrail layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<AttackCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<Confidence>,
}

impl GuardrailVerdict {
    /// Returns an accepting verdict with no additional context.
    #[must_use]
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
            category: None,
            confidence: None,
        }
    }

    /// Returns a rejecting verdict carrying the category's warning.
    #[must_use]
    pub fn reject(category: AttackCategory) -> Self {
        Self {
            accepted: false,
            reason: Some(category.warning().to_owned()),
            category: Some(category),
            confidence: None,
        }
    }

    /// Returns a rejecting verdict with an explicit reason.
    #[must_use]
    pub fn reject_with(category: AttackCategory, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
            category: Some(category),
            confidence: None,
        }
    }

    /// Attaches the analysis confidence to the verdict.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Returns true when the input may proceed.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Returns the internal reason for a rejection. Never shown to users.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the attack category for rejections.
    #[must_use]
    pub const fn category(&self) -> Option<AttackCategory> {
        self.category
    }

    /// Returns the analysis confidence when layer 2 produced the verdict.
    #[must_use]
    pub const fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }
}
