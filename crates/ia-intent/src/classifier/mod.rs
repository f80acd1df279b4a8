//! Semantic classifier: zero-shot fallback for low keyword confidence.
//!
//! The external capability ranks a fixed set of candidate labels against the
//! request text. [`SemanticClassifier`] adapts it to the pipeline: it supplies
//! the labels, maps the winning label to a template name, and turns every
//! failure (unreachable, erroring, too slow) into a zero-confidence result.

pub mod http;
pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ia_protocol::{MatchResult, MatchSource};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::error::ClassifierError;

pub use http::{HttpZeroShotClient, ZeroShotConfig};
pub use mock::StaticClassifier;

/// One ranked label from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// External zero-shot classification capability.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Rank `labels` against `text`, best first.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError>;

    /// Backend name (for logging).
    fn name(&self) -> &str;
}

/// Candidate label and the template it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub label: String,
    pub template: String,
}

impl LabelTemplate {
    pub fn new(label: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            template: template.into(),
        }
    }
}

/// Candidate labels for the built-in templates.
pub fn default_labels() -> Vec<LabelTemplate> {
    vec![
        LabelTemplate::new("create gcs bucket", "gcs-bucket"),
        LabelTemplate::new("create cloud storage bucket", "gcs-bucket"),
        LabelTemplate::new("create google storage", "gcs-bucket"),
        LabelTemplate::new("create virtual machine", "compute-instance"),
        LabelTemplate::new("create compute instance", "compute-instance"),
    ]
}

/// Adapter between the pipeline and a [`ZeroShotClassifier`] backend.
pub struct SemanticClassifier {
    backend: Arc<dyn ZeroShotClassifier>,
    labels: Vec<LabelTemplate>,
    timeout: Duration,
}

impl SemanticClassifier {
    pub fn new(
        backend: Arc<dyn ZeroShotClassifier>,
        labels: Vec<LabelTemplate>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            labels,
            timeout,
        }
    }

    /// Adapter over `backend` with the built-in labels.
    pub fn with_default_labels(backend: Arc<dyn ZeroShotClassifier>, timeout: Duration) -> Self {
        Self::new(backend, default_labels(), timeout)
    }

    fn template_for(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.template.as_str())
    }

    /// Classify `text` into a template.
    ///
    /// Never fails: backend errors and timeouts yield `(absent, 0.0)`. A top
    /// label with no template mapping yields `(absent, score)`.
    pub async fn classify(&self, text: &str) -> MatchResult {
        if self.labels.is_empty() {
            return MatchResult::unmatched(MatchSource::Semantic);
        }

        let candidates: Vec<String> = self.labels.iter().map(|l| l.label.clone()).collect();
        let ranked = match timeout(self.timeout, self.backend.classify(text, &candidates)).await {
            Ok(Ok(ranked)) => ranked,
            Ok(Err(e)) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "semantic classification failed");
                return MatchResult::unmatched(MatchSource::Semantic);
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "semantic classification timed out"
                );
                return MatchResult::unmatched(MatchSource::Semantic);
            }
        };

        // Top-ranked by score; earlier entries win ties.
        let mut best: Option<&LabelScore> = None;
        for entry in &ranked {
            if !entry.score.is_finite() {
                continue;
            }
            if best.is_none_or(|b| entry.score > b.score) {
                best = Some(entry);
            }
        }

        let Some(top) = best else {
            tracing::debug!(backend = self.backend.name(), "classifier returned no labels");
            return MatchResult::unmatched(MatchSource::Semantic);
        };

        match self.template_for(&top.label) {
            Some(template) => {
                tracing::debug!(label = %top.label, template, score = top.score, "semantic match");
                MatchResult::new(template, top.score, MatchSource::Semantic)
            }
            None => {
                tracing::debug!(label = %top.label, "classifier label has no template");
                MatchResult {
                    template_name: None,
                    confidence: top.score.clamp(0.0, 1.0),
                    source: MatchSource::Semantic,
                }
            }
        }
    }
}
