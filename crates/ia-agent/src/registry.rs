//! Function registry: template name → provisioning capability.
//!
//! The router looks functions up by template name; a miss is an ordinary
//! `None`, which the router reports as a dispatch error.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use ia_provision::{ComputeInstanceProvisioner, GcsBucketProvisioner, Provisioner};

/// Metadata about a registered function (used by the template listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub template: String,
    pub description: String,
}

/// Registry of provisioning functions, indexed by template name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Provisioner>>,
}

impl FunctionRegistry {
    /// Build a registry from a list of provisioners. Later entries replace
    /// earlier ones for the same template.
    pub fn new(provisioners: Vec<Arc<dyn Provisioner>>) -> Self {
        let mut registry = Self::default();
        for provisioner in provisioners {
            registry.register(provisioner);
        }
        registry
    }

    /// Build with the built-in provisioners.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Arc::new(GcsBucketProvisioner),
            Arc::new(ComputeInstanceProvisioner),
        ])
    }

    /// Register (or replace) the function for its template.
    pub fn register(&mut self, provisioner: Arc<dyn Provisioner>) {
        let template = provisioner.template().to_string();
        if self.functions.insert(template.clone(), provisioner).is_some() {
            tracing::debug!(template = %template, "replaced provisioning function");
        }
    }

    /// Look up the function for a template.
    pub fn get(&self, template: &str) -> Option<Arc<dyn Provisioner>> {
        self.functions.get(template).cloned()
    }

    pub fn contains(&self, template: &str) -> bool {
        self.functions.contains_key(template)
    }

    /// All registered functions, sorted by template name.
    pub fn list(&self) -> Vec<FunctionInfo> {
        let mut infos: Vec<FunctionInfo> = self
            .functions
            .values()
            .map(|p| FunctionInfo {
                template: p.template().to_string(),
                description: p.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.template.cmp(&b.template));
        infos
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut templates: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        templates.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("templates", &templates)
            .finish()
    }
}
