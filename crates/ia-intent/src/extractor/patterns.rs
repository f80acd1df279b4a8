//! Extraction pattern set: ordered candidate patterns per variable slot.
//!
//! Kept as data (TOML) so the priority order is declarative. The built-in set
//! lives in `data/patterns.toml`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{IntentError, IntentResult};
use crate::pattern::{RegexPattern, TextPattern};
use crate::templates::TemplateRegistry;

const BUILTIN_PATTERNS: &str = include_str!("../../data/patterns.toml");

#[derive(Debug, Deserialize)]
struct RawPatternSet {
    #[serde(default)]
    stopwords: Vec<String>,
    #[serde(default)]
    slot: Vec<RawSlot>,
    #[serde(default)]
    derive: Vec<RawDerivation>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    name: String,
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDerivation {
    target: String,
    source: String,
    #[serde(default)]
    table: HashMap<String, String>,
    fallback: Option<String>,
}

/// Fallback rule deriving a variable from a secondary signal.
///
/// The `source` capture is looked up in `table`; unknown keys map to
/// `fallback` when one is configured.
#[derive(Debug)]
pub struct Derivation {
    pub target: String,
    pub source: Box<dyn TextPattern>,
    pub table: HashMap<String, String>,
    pub fallback: Option<String>,
}

impl Derivation {
    /// Derived value for `text`, if the source signal is present.
    pub fn apply(&self, text: &str) -> Option<String> {
        let key = self.source.first_capture(text)?;
        self.table
            .get(key.trim())
            .or(self.fallback.as_ref())
            .cloned()
    }
}

/// Immutable mapping from variable name → ordered candidate patterns.
#[derive(Debug, Default)]
pub struct ExtractionPatternSet {
    slots: HashMap<String, Vec<Box<dyn TextPattern>>>,
    /// Lowercased captures that never count as a value.
    stopwords: HashSet<String>,
    derivations: Vec<Derivation>,
}

impl ExtractionPatternSet {
    /// The pattern set shipped with the crate.
    pub fn builtin() -> IntentResult<Self> {
        Self::from_toml_str(BUILTIN_PATTERNS)
    }

    /// Load from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> IntentResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| IntentError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and compile a pattern set. Every pattern must compile and expose a
    /// capture group.
    pub fn from_toml_str(toml_str: &str) -> IntentResult<Self> {
        let raw: RawPatternSet =
            toml::from_str(toml_str).map_err(|e| IntentError::Parse(e.to_string()))?;

        let mut set = Self::default();
        set.stopwords = raw.stopwords.iter().map(|w| w.to_lowercase()).collect();

        for slot in raw.slot {
            let compiled = slot
                .patterns
                .iter()
                .map(|p| RegexPattern::capturing(p).map(|r| Box::new(r) as Box<dyn TextPattern>))
                .collect::<IntentResult<Vec<_>>>()?;
            set.slots.entry(slot.name).or_default().extend(compiled);
        }

        for rule in raw.derive {
            set.derivations.push(Derivation {
                target: rule.target,
                source: Box::new(RegexPattern::capturing(&rule.source)?),
                table: rule.table,
                fallback: rule.fallback,
            });
        }

        tracing::debug!(
            slots = set.slots.len(),
            derivations = set.derivations.len(),
            "extraction pattern set loaded"
        );
        Ok(set)
    }

    /// Append a pattern to the end of a slot's candidate list.
    pub fn push(&mut self, var: impl Into<String>, pattern: Box<dyn TextPattern>) {
        self.slots.entry(var.into()).or_default().push(pattern);
    }

    /// Candidate patterns for a variable, in priority order.
    pub fn patterns(&self, var: &str) -> Option<&[Box<dyn TextPattern>]> {
        self.slots.get(var).map(Vec::as_slice)
    }

    pub fn is_stopword(&self, value: &str) -> bool {
        self.stopwords.contains(&value.to_lowercase())
    }

    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }

    /// Evaluate a slot's patterns in order and return the first usable capture.
    ///
    /// Errors if the slot is unknown; otherwise `Ok(None)` means no match.
    pub fn extract_one(&self, text: &str, var: &str) -> IntentResult<Option<String>> {
        let patterns = self
            .patterns(var)
            .ok_or_else(|| IntentError::UnknownVariable(var.to_string()))?;

        for pattern in patterns {
            for capture in pattern.captures(text) {
                let value = capture.trim();
                if !value.is_empty() && !self.is_stopword(value) {
                    tracing::trace!(var, pattern = pattern.source(), value, "slot filled");
                    return Ok(Some(value.to_string()));
                }
            }
        }
        Ok(None)
    }

    /// Template variables that have neither direct patterns nor a derivation.
    pub fn uncovered(&self, registry: &TemplateRegistry) -> Vec<(String, String)> {
        let mut uncovered = Vec::new();
        for template in registry.iter() {
            for var in template.all_vars() {
                let derived = self.derivations.iter().any(|d| d.target == var);
                if !self.slots.contains_key(var) && !derived {
                    uncovered.push((template.name.clone(), var.to_string()));
                }
            }
        }
        uncovered
    }
}
