//! The provisioning capability trait and shared argument helpers.

use async_trait::async_trait;
use ia_protocol::VariableMap;

use crate::error::{ProvisionError, ProvisionResult};

/// A provisioning function for one template.
///
/// Receives the extracted variables as named arguments and returns a result
/// record, or fails.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Template this function provisions (e.g., "gcs-bucket").
    fn template(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Provision the resource described by `variables`.
    async fn provision(&self, variables: &VariableMap) -> ProvisionResult<serde_json::Value>;
}

/// Fetch a required, non-blank argument.
pub fn required<'a>(variables: &'a VariableMap, name: &str) -> ProvisionResult<&'a str> {
    variables
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProvisionError::MissingArgument(name.to_string()))
}

/// Fetch an optional argument, falling back to `default` when absent or blank.
pub fn optional<'a>(variables: &'a VariableMap, name: &str, default: &'a str) -> &'a str {
    variables
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

pub(crate) fn invalid(name: &str, value: &str, reason: &str) -> ProvisionError {
    ProvisionError::InvalidArgument {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Validate a GCP project ID: 6–30 chars, lowercase letters, digits and
/// hyphens, starting with a letter and not ending with a hyphen.
pub fn validate_project_id(project_id: &str) -> ProvisionResult<()> {
    let len = project_id.len();
    if !(6..=30).contains(&len) {
        return Err(invalid("project_id", project_id, "must be 6-30 characters"));
    }
    if !project_id.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("project_id", project_id, "must start with a lowercase letter"));
    }
    if project_id.ends_with('-') {
        return Err(invalid("project_id", project_id, "must not end with a hyphen"));
    }
    if !project_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "project_id",
            project_id,
            "only lowercase letters, digits and hyphens are allowed",
        ));
    }
    Ok(())
}
