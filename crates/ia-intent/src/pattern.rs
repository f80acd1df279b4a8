//! Text-pattern capability used by the keyword matcher and extractor.
//!
//! Components only see [`TextPattern`]; [`RegexPattern`] is the `regex`
//! crate implementation. All patterns are case-insensitive.

use regex::{Regex, RegexBuilder};

use crate::error::{IntentError, IntentResult};

/// Narrow matching interface over a compiled text pattern.
pub trait TextPattern: Send + Sync + std::fmt::Debug {
    /// Original pattern source (for logging and diagnostics).
    fn source(&self) -> &str;

    /// Number of non-overlapping matches in `text`.
    fn count_matches(&self, text: &str) -> usize;

    /// First capture group of every match, in order of appearance.
    fn captures(&self, text: &str) -> Vec<String>;

    /// First capture group of the leftmost match.
    fn first_capture(&self, text: &str) -> Option<String> {
        self.captures(text).into_iter().next()
    }
}

/// Case-insensitive regular expression pattern.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Regex,
}

impl RegexPattern {
    /// Compile a case-insensitive pattern.
    pub fn compile(source: &str) -> IntentResult<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| IntentError::Pattern {
                pattern: source.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Compile a pattern that must expose at least one capture group.
    pub fn capturing(source: &str) -> IntentResult<Self> {
        let pattern = Self::compile(source)?;
        if pattern.regex.captures_len() < 2 {
            return Err(IntentError::Pattern {
                pattern: source.to_string(),
                message: "pattern has no capture group".into(),
            });
        }
        Ok(pattern)
    }

    /// Whole-word alternation over literal keywords: `\b(?:k1|k2|...)\b`.
    ///
    /// Keywords are escaped, so they never act as regex syntax. Words inside a
    /// multi-word keyword match across any run of whitespace. Alternation order
    /// follows keyword order.
    pub fn keyword_alternation<S: AsRef<str>>(keywords: &[S]) -> IntentResult<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| {
                k.as_ref()
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .filter(|k| !k.is_empty())
            .collect();

        if alternatives.is_empty() {
            return Err(IntentError::Pattern {
                pattern: String::new(),
                message: "keyword list is empty".into(),
            });
        }

        Self::compile(&format!(r"\b(?:{})\b", alternatives.join("|")))
    }
}

impl TextPattern for RegexPattern {
    fn source(&self) -> &str {
        &self.source
    }

    fn count_matches(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    fn captures(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}
