//! HTTP zero-shot classification client.
//!
//! Talks to a Hugging Face Inference API compatible endpoint
//! (`POST {endpoint}/models/{model}`) serving an NLI model such as
//! `facebook/bart-large-mnli`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LabelScore, LabelTemplate, ZeroShotClassifier, default_labels};
use crate::error::ClassifierError;

/// Configuration for the remote zero-shot classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ZeroShotConfig {
    /// Whether the semantic fallback is enabled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Inference API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to classify with.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token (optional).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Candidate labels and the template each one maps to.
    #[serde(default = "default_labels")]
    pub labels: Vec<LabelTemplate>,
}

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".into()
}
fn default_model() -> String {
    "facebook/bart-large-mnli".into()
}
fn default_api_token_env() -> String {
    "HF_API_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ZeroShotConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_token_env: default_api_token_env(),
            timeout_secs: default_timeout_secs(),
            labels: default_labels(),
        }
    }
}

impl ZeroShotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request body.
#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    parameters: ClassifyParameters<'a>,
}

#[derive(Serialize)]
struct ClassifyParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

/// Response body. Older deployments return parallel arrays, newer ones a
/// list of `{label, score}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Parallel { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelScore>),
}

impl ClassifyResponse {
    fn into_ranking(self) -> Result<Vec<LabelScore>, ClassifierError> {
        match self {
            Self::Parallel { labels, scores } => {
                if labels.len() != scores.len() {
                    return Err(ClassifierError::Decode(format!(
                        "{} labels but {} scores",
                        labels.len(),
                        scores.len()
                    )));
                }
                Ok(labels
                    .into_iter()
                    .zip(scores)
                    .map(|(label, score)| LabelScore { label, score })
                    .collect())
            }
            Self::Pairs(pairs) => Ok(pairs),
        }
    }
}

/// Client for a remote zero-shot classification endpoint.
pub struct HttpZeroShotClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpZeroShotClient {
    /// Build a client. The bearer token is read from `config.api_token_env`
    /// once, here.
    pub fn new(config: &ZeroShotConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClassifierError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        let token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.is_empty());
        Ok(Self {
            client,
            url: format!(
                "{}/models/{}",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ZeroShotClassifier for HttpZeroShotClient {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        let body = ClassifyRequest {
            inputs: text,
            parameters: ClassifyParameters {
                candidate_labels: labels,
                multi_label: false,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Unavailable("request timed out".into())
            } else {
                ClassifierError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClassifierError::Unavailable("model is loading".into()));
        }
        if !status.is_success() {
            return Err(ClassifierError::Http(format!("status {status}")));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;
        parsed.into_ranking()
    }

    fn name(&self) -> &str {
        "http-zero-shot"
    }
}
