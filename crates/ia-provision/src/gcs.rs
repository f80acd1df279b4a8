//! gcs-bucket: Cloud Storage bucket provisioning plan.

use async_trait::async_trait;
use chrono::Utc;
use ia_protocol::VariableMap;
use serde_json::json;

use crate::error::ProvisionResult;
use crate::types::{Provisioner, invalid, optional, required, validate_project_id};

const DEFAULT_LOCATION: &str = "US";
const DEFAULT_STORAGE_CLASS: &str = "STANDARD";
const STORAGE_CLASSES: &[&str] = &["STANDARD", "NEARLINE", "COLDLINE", "ARCHIVE"];

/// Builds the Terraform plan request for a GCS bucket.
pub struct GcsBucketProvisioner;

#[async_trait]
impl Provisioner for GcsBucketProvisioner {
    fn template(&self) -> &str {
        "gcs-bucket"
    }

    fn description(&self) -> &str {
        "Create a Google Cloud Storage bucket"
    }

    async fn provision(&self, variables: &VariableMap) -> ProvisionResult<serde_json::Value> {
        let bucket_name = required(variables, "bucket_name")?;
        let project_id = required(variables, "project_id")?;
        let location = optional(variables, "location", DEFAULT_LOCATION).to_uppercase();
        let storage_class =
            optional(variables, "storage_class", DEFAULT_STORAGE_CLASS).to_uppercase();

        validate_bucket_name(bucket_name)?;
        validate_project_id(project_id)?;
        if !STORAGE_CLASSES.contains(&storage_class.as_str()) {
            return Err(invalid(
                "storage_class",
                &storage_class,
                "must be one of STANDARD, NEARLINE, COLDLINE, ARCHIVE",
            ));
        }

        let workspace_name = format!("gcs-{bucket_name}");
        tracing::info!(
            bucket_name,
            project_id,
            location = %location,
            workspace = %workspace_name,
            "gcs bucket plan prepared"
        );

        Ok(json!({
            "template": "gcs-bucket",
            "template_path": "templates/gcp/gcs-bucket",
            "workspace_name": workspace_name,
            "variables": {
                "bucket_name": bucket_name,
                "project_id": project_id,
                "location": location,
                "storage_class": storage_class,
            },
            "status": "pending_terraform_apply",
            "requested_at": Utc::now(),
        }))
    }
}

/// GCS naming rules: 3–63 chars of lowercase letters, digits, `-`, `_`, `.`,
/// starting and ending with a letter or digit.
fn validate_bucket_name(name: &str) -> ProvisionResult<()> {
    if !(3..=63).contains(&name.len()) {
        return Err(invalid("bucket_name", name, "must be 3-63 characters"));
    }
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !name.starts_with(alnum) || !name.ends_with(alnum) {
        return Err(invalid(
            "bucket_name",
            name,
            "must start and end with a lowercase letter or digit",
        ));
    }
    if !name.chars().all(|c| alnum(c) || matches!(c, '-' | '_' | '.')) {
        return Err(invalid(
            "bucket_name",
            name,
            "only lowercase letters, digits, '-', '_' and '.' are allowed",
        ));
    }
    Ok(())
}
