//! Closed set of query intent categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Intent category of a user query. Exactly one applies per turn.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    /// General software development questions.
    #[default]
    General,
    /// Review, analysis or improvement of code.
    CodeReview,
    /// Concepts, definitions and how things work.
    Explanation,
    /// Errors and bugs that need fixing.
    Debugging,
    /// Standards, conventions and recommended practices.
    BestPractices,
    /// System design and architectural patterns.
    Architecture,
    /// Learning guides, roadmaps and tutorials.
    Learning,
}

impl PromptType {
    /// Every prompt type, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::CodeReview,
        Self::Explanation,
        Self::Debugging,
        Self::BestPractices,
        Self::Architecture,
        Self::Learning,
    ];

    /// Returns the snake case name used on the wire and in classifier replies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::CodeReview => "code_review",
            Self::Explanation => "explanation",
            Self::Debugging => "debugging",
            Self::BestPractices => "best_practices",
            Self::Architecture => "architecture",
            Self::Learning => "learning",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = Error;

    /// Exact, case-insensitive match against [`PromptType::as_str`] after
    /// trimming surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| Error::UnknownPromptType { name: s.to_owned() })
    }
}
