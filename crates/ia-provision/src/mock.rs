//! Scriptable provisioner for tests: succeeds, fails, or stalls on demand.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ia_protocol::VariableMap;
use serde_json::json;

use crate::error::{ProvisionError, ProvisionResult};
use crate::types::Provisioner;

/// Mock implementation of the `Provisioner` trait.
///
/// Records the variables of every call for assertion.
pub struct MockProvisioner {
    template: String,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<VariableMap>>,
}

impl MockProvisioner {
    /// A provisioner for `template` that echoes its arguments back.
    pub fn succeeding(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            failure: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provisioner for `template` that always fails with a backend error.
    pub fn failing(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::succeeding(template)
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Variables of every call received so far.
    pub fn calls(&self) -> Vec<VariableMap> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    fn template(&self) -> &str {
        &self.template
    }

    fn description(&self) -> &str {
        "mock provisioner"
    }

    async fn provision(&self, variables: &VariableMap) -> ProvisionResult<serde_json::Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(variables.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(message) => Err(ProvisionError::Backend(message.clone())),
            None => Ok(json!({
                "template": self.template,
                "variables": variables,
                "status": "mocked",
            })),
        }
    }
}
