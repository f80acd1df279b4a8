use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::{MatchSource, VariableMap};

/// Pipeline stage a request was in when its deadline elapsed.
///
/// Keyword matching and validation are synchronous and never observe the
/// deadline, so only the stages that check it appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classifying,
    Extracting,
    Dispatching,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifying => "classifying",
            Self::Extracting => "extracting",
            Self::Dispatching => "dispatching",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of running one request through the pipeline.
///
/// Every request ends in exactly one of these; none of them is an error in
/// the Rust sense. Callers match on the variant to decide what to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Template identified, variables validated, provisioning function ran.
    Success {
        template: String,
        confidence: f64,
        source: MatchSource,
        variables: VariableMap,
        result: serde_json::Value,
    },
    /// Template identified but one or more required variables are unfilled.
    MissingVariables {
        template: String,
        confidence: f64,
        source: MatchSource,
        missing: BTreeSet<String>,
        extracted: VariableMap,
    },
    /// No template reached an acceptable confidence.
    Unidentified,
    /// No provisioning function registered, or the function failed.
    DispatchError { template: String, message: String },
    /// The overall request deadline elapsed while `stage` was in flight.
    TimedOut {
        stage: Stage,
        #[serde(skip_serializing_if = "Option::is_none")]
        template: Option<String>,
    },
}

impl RequestOutcome {
    /// Short machine-readable name of the outcome kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::MissingVariables { .. } => "missing_variables",
            Self::Unidentified => "unidentified",
            Self::DispatchError { .. } => "dispatch_error",
            Self::TimedOut { .. } => "timed_out",
        }
    }

    /// Template the outcome refers to, when one was identified.
    pub fn template(&self) -> Option<&str> {
        match self {
            Self::Success { template, .. }
            | Self::MissingVariables { template, .. }
            | Self::DispatchError { template, .. } => Some(template),
            Self::TimedOut { template, .. } => template.as_deref(),
            Self::Unidentified => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Rendering envelope the process-facing surface wraps around an outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestReport {
    /// Unique request ID (UUIDv7 for time-sortability).
    pub request_id: Uuid,
    /// Original free-text request.
    pub text: String,
    pub outcome: RequestOutcome,
    /// End-to-end processing latency in milliseconds.
    pub latency_ms: u64,
    pub processed_at: DateTime<Utc>,
}

impl RequestReport {
    pub fn new(text: impl Into<String>, outcome: RequestOutcome, latency_ms: u64) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            text: text.into(),
            outcome,
            latency_ms,
            processed_at: Utc::now(),
        }
    }
}
