use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extracted variables keyed by variable name.
///
/// A variable that could not be extracted is simply absent. Ordered so that
/// two runs over the same text serialize identically.
pub type VariableMap = BTreeMap<String, String>;

/// Which identification stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Whole-word keyword scoring against the template registry.
    Keyword,
    /// Zero-shot semantic classification fallback.
    Semantic,
}

/// Result of identifying which template a request refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identified template, if any.
    pub template_name: Option<String>,
    /// Normalized score in `[0, 1]`.
    pub confidence: f64,
    /// Stage that produced this result.
    pub source: MatchSource,
}

impl MatchResult {
    pub fn new(template_name: impl Into<String>, confidence: f64, source: MatchSource) -> Self {
        Self {
            template_name: Some(template_name.into()),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// The "nothing matched" result: no template, zero confidence.
    pub fn unmatched(source: MatchSource) -> Self {
        Self {
            template_name: None,
            confidence: 0.0,
            source,
        }
    }

    pub fn is_match(&self) -> bool {
        self.template_name.is_some()
    }
}
