//! Deterministic in-process classifier for tests and offline runs.
//!
//! Returns a fixed ranking (or a fixed error), optionally after a delay, and
//! records every call for assertion.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{LabelScore, ZeroShotClassifier};
use crate::error::ClassifierError;

/// A recorded classify call: (text, candidate labels).
pub type ClassifyCall = (String, Vec<String>);

/// Classifier double with a canned response.
pub struct StaticClassifier {
    response: Result<Vec<LabelScore>, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ClassifyCall>>,
}

impl StaticClassifier {
    /// Always return `ranking`.
    pub fn ranked(ranking: Vec<LabelScore>) -> Self {
        Self {
            response: Ok(ranking),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fail as if the backend were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<ClassifyCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ZeroShotClassifier for StaticClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((text.to_string(), labels.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response
            .clone()
            .map_err(ClassifierError::Unavailable)
    }

    fn name(&self) -> &str {
        "static"
    }
}
