//! E2E tests for deadlines, out-of-band defaults, idempotence and
//! concurrent requests.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use ia_agent::registry::FunctionRegistry;
use ia_agent::router::RouterConfig;
use ia_intent::StaticClassifier;
use ia_protocol::{RequestOutcome, Stage};
use ia_provision::MockProvisioner;

use helpers::{QUOTED_BUCKET_REQUEST, TestHarness, bucket_ranking, vars};

/// A provisioning function that outlives the deadline is cancelled and
/// reported as a timeout at the dispatch stage.
#[tokio::test(start_paused = true)]
async fn e2e_dispatch_deadline() {
    let slow = Arc::new(
        MockProvisioner::succeeding("gcs-bucket").with_delay(Duration::from_secs(120)),
    );
    let h = TestHarness::build(
        Some(Arc::new(StaticClassifier::ranked(bucket_ranking()))),
        RouterConfig {
            deadline: Duration::from_secs(10),
            ..RouterConfig::default()
        },
        Some(FunctionRegistry::new(vec![slow.clone()])),
    );

    let outcome = h.process(QUOTED_BUCKET_REQUEST).await;

    assert_eq!(
        outcome,
        RequestOutcome::TimedOut {
            stage: Stage::Dispatching,
            template: Some("gcs-bucket".into()),
        }
    );
    assert_eq!(slow.calls().len(), 1);
}

/// A classifier that outlives the deadline is reported as a timeout at the
/// classification stage, with no template.
#[tokio::test(start_paused = true)]
async fn e2e_classifier_deadline() {
    let backend = StaticClassifier::ranked(bucket_ranking()).with_delay(Duration::from_secs(8));
    let h = TestHarness::build(
        Some(Arc::new(backend)),
        RouterConfig {
            deadline: Duration::from_secs(3),
            ..RouterConfig::default()
        },
        None,
    );

    let outcome = h.process(QUOTED_BUCKET_REQUEST).await;

    assert_eq!(
        outcome,
        RequestOutcome::TimedOut {
            stage: Stage::Classifying,
            template: None,
        }
    );
    assert!(h.gcs.calls().is_empty());
}

/// Timeout outcomes serialize with their stage.
#[tokio::test(start_paused = true)]
async fn e2e_timeout_serialization() {
    let backend = StaticClassifier::ranked(bucket_ranking()).with_delay(Duration::from_secs(8));
    let h = TestHarness::build(
        Some(Arc::new(backend)),
        RouterConfig {
            deadline: Duration::from_secs(1),
            ..RouterConfig::default()
        },
        None,
    );

    let json = serde_json::to_value(h.process(QUOTED_BUCKET_REQUEST).await).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"status": "timed_out", "stage": "classifying"})
    );
}

/// A failing provisioning function is a structured dispatch error.
#[tokio::test]
async fn e2e_provisioning_failure() {
    let h = TestHarness::with_functions(
        bucket_ranking(),
        FunctionRegistry::new(vec![Arc::new(MockProvisioner::failing(
            "gcs-bucket",
            "permission denied on project my-gcp-project",
        ))]),
    );

    let outcome = h.process(QUOTED_BUCKET_REQUEST).await;

    let RequestOutcome::DispatchError { template, message } = &outcome else {
        panic!("expected dispatch error, got {outcome:?}");
    };
    assert_eq!(template, "gcs-bucket");
    assert!(message.contains("permission denied"), "{message}");
}

/// Argument validation in the real provisioner surfaces as a dispatch error.
#[tokio::test]
async fn e2e_invalid_storage_class_rejected() {
    let h = TestHarness::with_functions(bucket_ranking(), FunctionRegistry::with_defaults());

    let outcome = h
        .process_with(QUOTED_BUCKET_REQUEST, &[("storage_class", "frozen")])
        .await;

    let RequestOutcome::DispatchError { message, .. } = &outcome else {
        panic!("expected dispatch error, got {outcome:?}");
    };
    assert!(message.contains("storage_class"), "{message}");
}

/// An out-of-band project completes an otherwise partial request.
#[tokio::test]
async fn e2e_defaults_complete_request() {
    let h = TestHarness::keyword_only();

    let missing = h.process(r#"GCS bucket "logs""#).await;
    assert_eq!(missing.kind(), "missing_variables");

    let outcome = h
        .process_with(r#"GCS bucket "logs""#, &[("project_id", "acme-prod")])
        .await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(
        h.gcs.calls(),
        vec![vars(&[("bucket_name", "logs"), ("project_id", "acme-prod")])]
    );
}

/// Values in the text always win over defaults; undeclared defaults are
/// ignored.
#[tokio::test]
async fn e2e_defaults_never_override_extracted() {
    let h = TestHarness::bucket_classifier();

    let outcome = h
        .process_with(
            QUOTED_BUCKET_REQUEST,
            &[("project_id", "fallback-project"), ("zone", "us-east1-b")],
        )
        .await;

    let RequestOutcome::Success { variables, .. } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(variables["project_id"], "my-gcp-project");
    assert!(!variables.contains_key("zone"));
}

/// Running the same request twice yields the same template and variables.
#[tokio::test]
async fn e2e_idempotent_requests() {
    let h = TestHarness::bucket_classifier();

    for text in [QUOTED_BUCKET_REQUEST, "Create a GCS bucket", "What's the weather today?"] {
        let first = h.process(text).await;
        let second = h.process(text).await;
        assert_eq!(first, second, "{text}");
    }
    // Only the two low-confidence requests consulted the classifier.
    assert_eq!(h.classifier_calls(), 4);
}

/// One router serves many concurrent requests without interference.
#[tokio::test]
async fn e2e_concurrent_requests() {
    let h = TestHarness::bucket_classifier();

    let mut handles = Vec::new();
    for i in 0..16 {
        let router = h.router.clone();
        handles.push(tokio::spawn(async move {
            let text = format!(r#"Create a GCS bucket called "data-{i}" in project "my-gcp-project""#);
            router.process(&text, &Default::default()).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        let RequestOutcome::Success { variables, .. } = &outcome else {
            panic!("request {i}: expected success, got {outcome:?}");
        };
        assert_eq!(variables["bucket_name"], format!("data-{i}"));
    }
    assert_eq!(h.gcs.calls().len(), 16);
    assert!(h.compute.calls().is_empty());
}
