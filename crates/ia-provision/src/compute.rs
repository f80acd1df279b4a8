//! compute-instance: Compute Engine VM provisioning plan.

use async_trait::async_trait;
use chrono::Utc;
use ia_protocol::VariableMap;
use serde_json::json;

use crate::error::ProvisionResult;
use crate::types::{Provisioner, invalid, optional, required, validate_project_id};

const DEFAULT_ZONE: &str = "us-central1-a";

/// Builds the Terraform plan request for a Compute Engine instance.
pub struct ComputeInstanceProvisioner;

#[async_trait]
impl Provisioner for ComputeInstanceProvisioner {
    fn template(&self) -> &str {
        "compute-instance"
    }

    fn description(&self) -> &str {
        "Create a Compute Engine virtual machine"
    }

    async fn provision(&self, variables: &VariableMap) -> ProvisionResult<serde_json::Value> {
        let instance_name = required(variables, "instance_name")?;
        let project_id = required(variables, "project_id")?;
        let instance_type = required(variables, "instance_type")?.to_lowercase();
        let zone = optional(variables, "zone", DEFAULT_ZONE).to_lowercase();

        validate_instance_name(instance_name)?;
        validate_project_id(project_id)?;

        let workspace_name = format!("vm-{instance_name}");
        tracing::info!(
            instance_name,
            project_id,
            instance_type = %instance_type,
            zone = %zone,
            "compute instance plan prepared"
        );

        Ok(json!({
            "template": "compute-instance",
            "template_path": "templates/gcp/compute-instance",
            "workspace_name": workspace_name,
            "variables": {
                "instance_name": instance_name,
                "project_id": project_id,
                "machine_type": instance_type,
                "zone": zone,
            },
            "status": "pending_terraform_apply",
            "requested_at": Utc::now(),
        }))
    }
}

/// Instance names: 1–63 chars, lowercase letters, digits and hyphens,
/// starting with a letter and not ending with a hyphen.
fn validate_instance_name(name: &str) -> ProvisionResult<()> {
    if name.is_empty() || name.len() > 63 {
        return Err(invalid("instance_name", name, "must be 1-63 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) || name.ends_with('-') {
        return Err(invalid(
            "instance_name",
            name,
            "must start with a lowercase letter and not end with a hyphen",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "instance_name",
            name,
            "only lowercase letters, digits and hyphens are allowed",
        ));
    }
    Ok(())
}
