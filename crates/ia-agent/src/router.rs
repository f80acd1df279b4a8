//! Request router: drives one request through the pipeline.
//!
//! ```text
//! Identifying ─(confidence < handoff)─> Classifying ─(< accept)─> Unidentified
//!      │                                     │
//!      └──────────────> Extracting <─────────┘
//!                           │
//!                       Validating ──> MissingVariables
//!                           │
//!                       Dispatching ──> Success | DispatchError
//! ```
//!
//! Every path ends in a [`RequestOutcome`]. An overall deadline covers the
//! whole request; if it elapses the outcome is `TimedOut` with the stage that
//! was in flight.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use ia_intent::{
    ExtractionPatternSet, HttpZeroShotClient, IntentResult, KeywordMatcher, SemanticClassifier,
    TemplateRegistry, VariableExtractor,
};
use ia_protocol::{MatchResult, RequestOutcome, Stage, VariableMap};
use tokio::time::{Instant, timeout_at};

use crate::config::AgentConfig;
use crate::registry::FunctionRegistry;

/// Roughly thirty years.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

/// Routing policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    /// Keyword confidence at or above this skips the classifier.
    pub handoff_threshold: f64,
    /// Minimum confidence, from either stage, to accept an identification.
    pub accept_threshold: f64,
    /// Overall per-request deadline.
    pub deadline: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            handoff_threshold: 0.4,
            accept_threshold: 0.2,
            deadline: Duration::from_secs(30),
        }
    }
}

impl From<&AgentConfig> for RouterConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            handoff_threshold: config.thresholds.handoff,
            accept_threshold: config.thresholds.accept,
            deadline: config.deadline(),
        }
    }
}

/// Routes free-text requests to provisioning functions.
///
/// Holds only read-only state, so one router can serve any number of
/// concurrent requests.
pub struct RequestRouter {
    registry: Arc<TemplateRegistry>,
    matcher: KeywordMatcher,
    classifier: Option<SemanticClassifier>,
    extractor: VariableExtractor,
    functions: FunctionRegistry,
    config: RouterConfig,
}

impl RequestRouter {
    /// Build a router without a semantic fallback.
    pub fn new(
        registry: Arc<TemplateRegistry>,
        patterns: Arc<ExtractionPatternSet>,
        functions: FunctionRegistry,
        config: RouterConfig,
    ) -> IntentResult<Self> {
        for (template, var) in patterns.uncovered(&registry) {
            tracing::warn!(template = %template, var = %var, "variable has no extraction patterns");
        }
        Ok(Self {
            matcher: KeywordMatcher::new(&registry)?,
            extractor: VariableExtractor::new(registry.clone(), patterns),
            registry,
            classifier: None,
            functions,
            config,
        })
    }

    /// Enable the semantic classifier fallback.
    pub fn with_classifier(mut self, classifier: SemanticClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build a router from agent configuration with the built-in
    /// provisioning functions.
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Self> {
        let registry = Arc::new(config.load_registry()?);
        let patterns = Arc::new(config.load_patterns()?);
        let mut router = Self::new(
            registry,
            patterns,
            FunctionRegistry::with_defaults(),
            RouterConfig::from(config),
        )?;

        if config.classifier.enabled {
            let client = HttpZeroShotClient::new(&config.classifier)?;
            tracing::info!(url = client.url(), "semantic classifier enabled");
            router = router.with_classifier(SemanticClassifier::new(
                Arc::new(client),
                config.classifier.labels.clone(),
                config.classifier.timeout(),
            ));
        }

        Ok(router)
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Process one request.
    ///
    /// `defaults` are out-of-band values (e.g. a project supplied by the
    /// caller). They fill declared variables that extraction left empty and
    /// never override extracted values.
    pub async fn process(&self, text: &str, defaults: &VariableMap) -> RequestOutcome {
        let deadline = deadline_after(self.config.deadline);

        // Identifying / Classifying
        let identified = match self.identify(text, deadline).await {
            Ok(Some(identified)) => identified,
            Ok(None) => {
                tracing::info!(outcome = "unidentified", "no template reached acceptable confidence");
                return RequestOutcome::Unidentified;
            }
            Err(stage) => return timed_out(stage, None),
        };
        let Some(template) = identified.template_name.clone() else {
            return RequestOutcome::Unidentified;
        };
        let confidence = identified.confidence;
        let source = identified.source;

        // Extracting
        if Instant::now() >= deadline {
            return timed_out(Stage::Extracting, Some(template));
        }
        let mut variables = self.extractor.extract(text, &template);
        self.apply_defaults(&template, &mut variables, defaults);

        // Validating
        let missing = self.missing_required(&template, &variables);
        if !missing.is_empty() {
            tracing::info!(
                template = %template,
                missing = ?missing,
                outcome = "missing_variables",
                "required variables not provided"
            );
            return RequestOutcome::MissingVariables {
                template,
                confidence,
                source,
                missing,
                extracted: variables,
            };
        }

        // Dispatching
        if Instant::now() >= deadline {
            return timed_out(Stage::Dispatching, Some(template));
        }
        match self.dispatch(&template, &variables, deadline).await {
            Dispatch::Done(result) => {
                tracing::info!(template = %template, confidence, outcome = "success", "request provisioned");
                RequestOutcome::Success {
                    template,
                    confidence,
                    source,
                    variables,
                    result,
                }
            }
            Dispatch::Failed(message) => {
                tracing::warn!(template = %template, error = %message, outcome = "dispatch_error", "dispatch failed");
                RequestOutcome::DispatchError { template, message }
            }
            Dispatch::Elapsed => timed_out(Stage::Dispatching, Some(template)),
        }
    }

    /// Keyword match first; the classifier only runs below the handoff
    /// threshold. Either way the result must reach the acceptance floor.
    /// `Err` carries the stage the deadline interrupted.
    async fn identify(&self, text: &str, deadline: Instant) -> Result<Option<MatchResult>, Stage> {
        if text.trim().is_empty() {
            tracing::debug!("blank request");
            return Ok(None);
        }
        let keyword = self.matcher.identify(text);
        let candidate = if keyword.is_match() && keyword.confidence >= self.config.handoff_threshold {
            keyword
        } else {
            let Some(classifier) = &self.classifier else {
                tracing::debug!("keyword confidence below handoff and no classifier configured");
                return Ok(None);
            };
            if Instant::now() >= deadline {
                return Err(Stage::Classifying);
            }
            let semantic = timeout_at(deadline, classifier.classify(text))
                .await
                .map_err(|_| Stage::Classifying)?;
            tracing::debug!(
                template = ?semantic.template_name,
                confidence = semantic.confidence,
                "semantic match"
            );
            semantic
        };

        if candidate.is_match() && candidate.confidence >= self.config.accept_threshold {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    fn apply_defaults(&self, template: &str, variables: &mut VariableMap, defaults: &VariableMap) {
        let Some(definition) = self.registry.get(template) else {
            return;
        };
        for (name, value) in defaults {
            if !definition.declares(name) || !is_blank(variables.get(name)) {
                continue;
            }
            tracing::debug!(template, var = %name, "variable filled from defaults");
            variables.insert(name.clone(), value.clone());
        }
    }

    fn missing_required(&self, template: &str, variables: &VariableMap) -> BTreeSet<String> {
        self.registry
            .get(template)
            .map(|definition| {
                definition
                    .required_vars
                    .iter()
                    .filter(|name| is_blank(variables.get(name.as_str())))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Run the provisioning function on its own task so a panic or the
    /// deadline can't take the router down with it.
    async fn dispatch(&self, template: &str, variables: &VariableMap, deadline: Instant) -> Dispatch {
        let Some(function) = self.functions.get(template) else {
            return Dispatch::Failed(format!("no function registered for template '{template}'"));
        };

        let args = variables.clone();
        let mut handle = tokio::spawn(async move { function.provision(&args).await });

        match timeout_at(deadline, &mut handle).await {
            Ok(Ok(Ok(result))) => Dispatch::Done(result),
            Ok(Ok(Err(e))) => Dispatch::Failed(e.to_string()),
            Ok(Err(join_err)) if join_err.is_panic() => {
                Dispatch::Failed("provisioning function panicked".into())
            }
            Ok(Err(join_err)) => Dispatch::Failed(format!("provisioning task failed: {join_err}")),
            Err(_) => {
                handle.abort();
                Dispatch::Elapsed
            }
        }
    }
}

enum Dispatch {
    Done(serde_json::Value),
    Failed(String),
    Elapsed,
}

/// Deadline `budget` from now. Budgets too large for the clock saturate to a
/// far-future instant instead of overflowing.
fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn timed_out(stage: Stage, template: Option<String>) -> RequestOutcome {
    tracing::warn!(stage = %stage, template = ?template, outcome = "timed_out", "request deadline elapsed");
    RequestOutcome::TimedOut { stage, template }
}
