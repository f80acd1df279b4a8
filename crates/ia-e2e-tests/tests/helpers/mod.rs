//! Shared test harness for E2E integration tests.
//!
//! Wires the real template registry, pattern set and router together with
//! test doubles at the two external edges: the zero-shot classifier and the
//! provisioning functions.

use std::sync::Arc;
use std::time::Duration;

use ia_agent::registry::FunctionRegistry;
use ia_agent::router::{RequestRouter, RouterConfig};
use ia_intent::{
    ExtractionPatternSet, LabelScore, SemanticClassifier, StaticClassifier, TemplateRegistry,
    ZeroShotClassifier,
};
use ia_protocol::{RequestOutcome, VariableMap};
use ia_provision::MockProvisioner;

pub const QUOTED_BUCKET_REQUEST: &str = r#"Create a GCS bucket called "my-data" in project "my-gcp-project""#;

/// End-to-end harness around a fully built router.
pub struct TestHarness {
    pub router: Arc<RequestRouter>,
    /// Mock behind `gcs-bucket`, when the harness uses mocks.
    pub gcs: Arc<MockProvisioner>,
    /// Mock behind `compute-instance`, when the harness uses mocks.
    pub compute: Arc<MockProvisioner>,
    /// Classifier double, when one is installed.
    pub classifier: Option<Arc<StaticClassifier>>,
}

impl TestHarness {
    /// Keyword matching only, mock provisioning functions.
    pub fn keyword_only() -> Self {
        Self::build(None, RouterConfig::default(), None)
    }

    /// Classifier fallback that always answers `ranking`.
    pub fn with_ranking(ranking: Vec<LabelScore>) -> Self {
        Self::build(
            Some(Arc::new(StaticClassifier::ranked(ranking))),
            RouterConfig::default(),
            None,
        )
    }

    /// Classifier fallback that is confident the request is a bucket.
    pub fn bucket_classifier() -> Self {
        Self::with_ranking(bucket_ranking())
    }

    /// Like [`Self::with_ranking`] but dispatching to the given registry.
    pub fn with_functions(ranking: Vec<LabelScore>, functions: FunctionRegistry) -> Self {
        Self::build(
            Some(Arc::new(StaticClassifier::ranked(ranking))),
            RouterConfig::default(),
            Some(functions),
        )
    }

    /// Full control over classifier, routing policy and functions.
    pub fn build(
        classifier: Option<Arc<StaticClassifier>>,
        config: RouterConfig,
        functions: Option<FunctionRegistry>,
    ) -> Self {
        let gcs = Arc::new(MockProvisioner::succeeding("gcs-bucket"));
        let compute = Arc::new(MockProvisioner::succeeding("compute-instance"));
        let functions =
            functions.unwrap_or_else(|| FunctionRegistry::new(vec![gcs.clone(), compute.clone()]));

        let mut router = router(functions, config);
        if let Some(backend) = &classifier {
            router = router.with_classifier(adapter(backend.clone()));
        }

        Self {
            router: Arc::new(router),
            gcs,
            compute,
            classifier,
        }
    }

    pub async fn process(&self, text: &str) -> RequestOutcome {
        self.router.process(text, &VariableMap::new()).await
    }

    pub async fn process_with(&self, text: &str, defaults: &[(&str, &str)]) -> RequestOutcome {
        self.router.process(text, &vars(defaults)).await
    }

    /// Number of classifier calls made so far (0 without a classifier).
    pub fn classifier_calls(&self) -> usize {
        self.classifier.as_ref().map_or(0, |c| c.calls().len())
    }
}

/// Router over the built-in registry and pattern set.
pub fn router(functions: FunctionRegistry, config: RouterConfig) -> RequestRouter {
    RequestRouter::new(
        Arc::new(TemplateRegistry::builtin().unwrap()),
        Arc::new(ExtractionPatternSet::builtin().unwrap()),
        functions,
        config,
    )
    .unwrap()
}

/// Adapter with the built-in labels and a generous timeout.
pub fn adapter(backend: Arc<dyn ZeroShotClassifier>) -> SemanticClassifier {
    SemanticClassifier::with_default_labels(backend, Duration::from_secs(10))
}

pub fn bucket_ranking() -> Vec<LabelScore> {
    vec![
        LabelScore::new("create gcs bucket", 0.92),
        LabelScore::new("create cloud storage bucket", 0.05),
        LabelScore::new("create virtual machine", 0.03),
    ]
}

pub fn vars(pairs: &[(&str, &str)]) -> VariableMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
