//! Agent configuration, loadable from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ia_intent::{ExtractionPatternSet, IntentResult, TemplateRegistry, ZeroShotConfig};
use ia_protocol::VariableMap;
use serde::Deserialize;

/// Confidence policy for template identification.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    /// Keyword confidence below this hands off to the semantic classifier.
    #[serde(default = "default_handoff")]
    pub handoff: f64,
    /// Identifications below this, from either stage, leave the request
    /// unidentified.
    #[serde(default = "default_accept")]
    pub accept: f64,
}

fn default_handoff() -> f64 {
    0.4
}

fn default_accept() -> f64 {
    0.2
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            handoff: default_handoff(),
            accept: default_accept(),
        }
    }
}

/// Top-level configuration for the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Overall per-request deadline in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// Template registry JSON. None uses the built-in registry.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    /// Extraction pattern TOML. None uses the built-in pattern set.
    #[serde(default)]
    pub patterns_path: Option<PathBuf>,
    /// Zero-shot classifier fallback. Enabled by default.
    #[serde(default)]
    pub classifier: ZeroShotConfig,
    /// Out-of-band variable defaults (e.g. `project_id`).
    #[serde(default)]
    pub defaults: VariableMap,
}

/// Upper bound on `deadline_secs` (one day).
pub const MAX_DEADLINE_SECS: u64 = 86_400;

fn default_deadline_secs() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            deadline_secs: default_deadline_secs(),
            registry_path: None,
            patterns_path: None,
            classifier: ZeroShotConfig::default(),
            defaults: VariableMap::new(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold values outside `[0, 1]`, a handoff below the
    /// acceptance floor and deadlines outside `1..=MAX_DEADLINE_SECS`.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("thresholds.handoff", self.thresholds.handoff),
            ("thresholds.accept", self.thresholds.accept),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be within [0, 1], got {value}");
            }
        }
        if self.thresholds.handoff < self.thresholds.accept {
            anyhow::bail!(
                "thresholds.handoff ({}) must not be below thresholds.accept ({})",
                self.thresholds.handoff,
                self.thresholds.accept
            );
        }
        if self.deadline_secs == 0 {
            anyhow::bail!("deadline_secs must be greater than zero");
        }
        if self.deadline_secs > MAX_DEADLINE_SECS {
            anyhow::bail!(
                "deadline_secs must be at most {MAX_DEADLINE_SECS}, got {}",
                self.deadline_secs
            );
        }
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Load the configured template registry, or the built-in one.
    pub fn load_registry(&self) -> IntentResult<TemplateRegistry> {
        match &self.registry_path {
            Some(path) => TemplateRegistry::from_file(path),
            None => TemplateRegistry::builtin(),
        }
    }

    /// Load the configured extraction pattern set, or the built-in one.
    pub fn load_patterns(&self) -> IntentResult<ExtractionPatternSet> {
        match &self.patterns_path {
            Some(path) => ExtractionPatternSet::from_file(path),
            None => ExtractionPatternSet::builtin(),
        }
    }
}
