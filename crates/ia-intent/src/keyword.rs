//! Keyword matcher: local, zero-cost template identification.
//!
//! Each template gets one whole-word, case-insensitive alternation of its
//! keywords. A template's score is the number of matches in the input;
//! confidence is the best score divided by the number of whitespace tokens.
//!
//! Ties go to the template that comes first in registry order.

use ia_protocol::{MatchResult, MatchSource};

use crate::error::IntentResult;
use crate::pattern::{RegexPattern, TextPattern};
use crate::templates::TemplateRegistry;

/// Scores request text against every template's keyword signature.
#[derive(Debug)]
pub struct KeywordMatcher {
    /// (template name, compiled keyword alternation) in registry order.
    patterns: Vec<(String, Box<dyn TextPattern>)>,
}

impl KeywordMatcher {
    /// Compile keyword patterns for every template in the registry.
    pub fn new(registry: &TemplateRegistry) -> IntentResult<Self> {
        let patterns = registry
            .iter()
            .map(|t| {
                let pattern = RegexPattern::keyword_alternation(&t.keywords)?;
                Ok((t.name.clone(), Box::new(pattern) as Box<dyn TextPattern>))
            })
            .collect::<IntentResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Build from explicit patterns (e.g. a different text-pattern engine).
    pub fn from_patterns(patterns: Vec<(String, Box<dyn TextPattern>)>) -> Self {
        Self { patterns }
    }

    /// Raw keyword match count per template, in registry order.
    pub fn scores(&self, text: &str) -> Vec<(&str, usize)> {
        self.patterns
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern.count_matches(text)))
            .collect()
    }

    /// Identify the best-matching template.
    ///
    /// Returns `(absent, 0.0)` when no keyword matches anywhere, including
    /// for empty input.
    pub fn identify(&self, text: &str) -> MatchResult {
        let mut best: Option<(&str, usize)> = None;
        for (name, score) in self.scores(text) {
            // Strict `>` keeps the earliest template on ties.
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((name, score));
            }
        }

        let Some((name, score)) = best else {
            return MatchResult::unmatched(MatchSource::Keyword);
        };

        let tokens = text.split_whitespace().count();
        let confidence = if tokens == 0 {
            0.0
        } else {
            score as f64 / tokens as f64
        };

        tracing::debug!(template = name, score, tokens, confidence, "keyword match");
        MatchResult::new(name, confidence, MatchSource::Keyword)
    }
}
