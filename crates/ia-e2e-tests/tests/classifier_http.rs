//! E2E tests for the HTTP zero-shot classifier fallback, against a mock
//! inference server, with the router built from configuration.

use std::time::Duration;

use ia_agent::config::AgentConfig;
use ia_agent::router::RequestRouter;
use ia_intent::ZeroShotConfig;
use ia_protocol::{MatchSource, RequestOutcome, VariableMap};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUOTED_BUCKET_REQUEST: &str = r#"Create a GCS bucket called "my-data" in project "my-gcp-project""#;
const MODEL_PATH: &str = "/models/facebook/bart-large-mnli";

fn config_for(server: &MockServer, timeout_secs: u64) -> AgentConfig {
    AgentConfig {
        classifier: ZeroShotConfig {
            enabled: true,
            endpoint: server.uri(),
            api_token_env: "IA_E2E_TOKEN_UNSET".into(),
            timeout_secs,
            ..ZeroShotConfig::default()
        },
        ..AgentConfig::default()
    }
}

/// Low keyword confidence hands off to the inference server, whose top
/// label identifies the template.
#[tokio::test]
async fn e2e_http_classifier_identifies_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_partial_json(json!({ "inputs": QUOTED_BUCKET_REQUEST })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequence": QUOTED_BUCKET_REQUEST,
            "labels": [
                "create gcs bucket",
                "create cloud storage bucket",
                "create google storage",
                "create compute instance",
                "create virtual machine"
            ],
            "scores": [0.71, 0.2, 0.05, 0.02, 0.02]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = RequestRouter::from_config(&config_for(&server, 5)).unwrap();
    let outcome = router.process(QUOTED_BUCKET_REQUEST, &VariableMap::new()).await;

    let RequestOutcome::Success {
        template,
        source,
        confidence,
        result,
        ..
    } = &outcome
    else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(template, "gcs-bucket");
    assert_eq!(*source, MatchSource::Semantic);
    assert!((confidence - 0.71).abs() < 1e-9);
    assert_eq!(result["workspace_name"], "gcs-my-data");
}

/// The shipped configuration routes a low-confidence keyword request through
/// the classifier; only the endpoint differs here.
#[tokio::test]
async fn e2e_default_config_routes_quoted_bucket_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "create gcs bucket", "score": 0.88},
            {"label": "create virtual machine", "score": 0.12}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = AgentConfig::default();
    config.classifier.endpoint = server.uri();
    config.classifier.api_token_env = "IA_E2E_TOKEN_UNSET".into();
    assert!(config.validate().is_ok());

    let router = RequestRouter::from_config(&config).unwrap();
    let outcome = router.process(QUOTED_BUCKET_REQUEST, &VariableMap::new()).await;

    let RequestOutcome::Success {
        template,
        source,
        variables,
        ..
    } = &outcome
    else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(template, "gcs-bucket");
    assert_eq!(*source, MatchSource::Semantic);
    assert_eq!(variables["bucket_name"], "my-data");
    assert_eq!(variables["project_id"], "my-gcp-project");
}

/// Confident keyword matches never call the inference server.
#[tokio::test]
async fn e2e_http_classifier_skipped_for_confident_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let router = RequestRouter::from_config(&config_for(&server, 5)).unwrap();
    let outcome = router.process("Create a GCS bucket", &VariableMap::new()).await;
    assert_eq!(outcome.kind(), "missing_variables");
}

/// A failing inference server degrades to unidentified.
#[tokio::test]
async fn e2e_http_classifier_server_error_is_unidentified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let router = RequestRouter::from_config(&config_for(&server, 5)).unwrap();
    let outcome = router.process(QUOTED_BUCKET_REQUEST, &VariableMap::new()).await;
    assert_eq!(outcome, RequestOutcome::Unidentified);
}

/// A model that is still loading (503) degrades to unidentified.
#[tokio::test]
async fn e2e_http_classifier_model_loading_is_unidentified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model facebook/bart-large-mnli is currently loading",
            "estimated_time": 20.0
        })))
        .mount(&server)
        .await;

    let router = RequestRouter::from_config(&config_for(&server, 5)).unwrap();
    let outcome = router.process(QUOTED_BUCKET_REQUEST, &VariableMap::new()).await;
    assert_eq!(outcome, RequestOutcome::Unidentified);
}

/// A server slower than the classifier timeout degrades to unidentified
/// well before the overall deadline.
#[tokio::test]
async fn e2e_http_classifier_slow_server_is_unidentified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"labels": ["create gcs bucket"], "scores": [0.99]}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let router = RequestRouter::from_config(&config_for(&server, 1)).unwrap();
    let start = std::time::Instant::now();
    let outcome = router.process(QUOTED_BUCKET_REQUEST, &VariableMap::new()).await;

    assert_eq!(outcome, RequestOutcome::Unidentified);
    assert!(start.elapsed() < Duration::from_secs(5));
}

/// Custom labels from configuration replace the built-in ones.
#[tokio::test]
async fn e2e_http_classifier_custom_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "parameters": {"candidate_labels": ["spin up a server"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "spin up a server", "score": 0.9}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, 5);
    config.classifier.labels = vec![ia_intent::LabelTemplate::new(
        "spin up a server",
        "compute-instance",
    )];

    let router = RequestRouter::from_config(&config).unwrap();
    let outcome = router
        .process("I need a box to run my app", &VariableMap::new())
        .await;

    let RequestOutcome::MissingVariables {
        template, missing, ..
    } = &outcome
    else {
        panic!("expected missing variables, got {outcome:?}");
    };
    assert_eq!(template, "compute-instance");
    assert!(missing.contains("instance_name"));
    assert!(missing.contains("project_id"));
}
