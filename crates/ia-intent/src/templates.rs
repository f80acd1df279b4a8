//! Template registry: the static catalogue of provisioning templates.
//!
//! Loaded once from a JSON document of the form
//!
//! ```json
//! {"templates": {"gcs-bucket": {"keywords": ["gcs", "bucket"],
//!                               "required_vars": ["bucket_name", "project_id"],
//!                               "optional_vars": ["location"]}}}
//! ```
//!
//! Document order is preserved and becomes the registry iteration order,
//! which the keyword matcher uses to break ties. Every schema problem is
//! reported at load time.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{IntentError, IntentResult};

/// Built-in registry shipped with the crate.
const BUILTIN_REGISTRY: &str = include_str!("../data/registry.json");

/// A named provisioning recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    pub name: String,
    /// Keywords in declared order.
    pub keywords: Vec<String>,
    /// Variables that must be present before dispatch.
    pub required_vars: Vec<String>,
    /// Variables that are extracted when present but never required.
    pub optional_vars: Vec<String>,
}

impl TemplateDefinition {
    /// Required variables followed by optional ones.
    pub fn all_vars(&self) -> impl Iterator<Item = &str> {
        self.required_vars
            .iter()
            .chain(self.optional_vars.iter())
            .map(String::as_str)
    }

    pub fn is_required(&self, var: &str) -> bool {
        self.required_vars.iter().any(|v| v == var)
    }

    pub fn declares(&self, var: &str) -> bool {
        self.all_vars().any(|v| v == var)
    }
}

/// Raw entry shape. All three keys are mandatory.
#[derive(Debug, Deserialize)]
struct RawTemplate {
    keywords: Vec<String>,
    required_vars: Vec<String>,
    optional_vars: Vec<String>,
}

/// Read-only registry of templates, indexed by name.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<TemplateDefinition>,
    /// Map from template name → index into `templates`.
    index: HashMap<String, usize>,
}

impl TemplateRegistry {
    /// Build a registry from already-constructed definitions, validating each.
    pub fn new(templates: Vec<TemplateDefinition>) -> IntentResult<Self> {
        let mut index = HashMap::new();
        for (i, template) in templates.iter().enumerate() {
            validate(template)?;
            if index.insert(template.name.clone(), i).is_some() {
                return Err(schema(&template.name, "duplicate template name"));
            }
        }
        Ok(Self { templates, index })
    }

    /// The registry shipped with the crate.
    pub fn builtin() -> IntentResult<Self> {
        Self::from_json_str(BUILTIN_REGISTRY)
    }

    /// Load from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> IntentResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| IntentError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Parse a registry document.
    pub fn from_json_str(json: &str) -> IntentResult<Self> {
        let doc: serde_json::Value =
            serde_json::from_str(json).map_err(|e| IntentError::Parse(e.to_string()))?;

        let entries = doc
            .get("templates")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| IntentError::Parse("missing 'templates' object".into()))?;

        let mut templates = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let raw: RawTemplate =
                serde_json::from_value(entry.clone()).map_err(|e| schema(name, &e.to_string()))?;
            templates.push(TemplateDefinition {
                name: name.clone(),
                keywords: raw.keywords,
                required_vars: raw.required_vars,
                optional_vars: raw.optional_vars,
            });
        }

        let registry = Self::new(templates)?;
        tracing::debug!(templates = registry.len(), "template registry loaded");
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.index.get(name).map(|&i| &self.templates[i])
    }

    /// Templates in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn validate(template: &TemplateDefinition) -> IntentResult<()> {
    let name = &template.name;
    if name.trim().is_empty() {
        return Err(schema(name, "template name is empty"));
    }
    if template.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(schema(name, "keywords must not be empty"));
    }

    let mut seen = HashSet::new();
    for var in template.all_vars() {
        if var.trim().is_empty() {
            return Err(schema(name, "variable names must not be empty"));
        }
        if !seen.insert(var) {
            let optional = template.optional_vars.iter().any(|v| v == var);
            let message = if template.is_required(var) && optional {
                format!("'{var}' is both required and optional")
            } else {
                format!("'{var}' is declared twice")
            };
            return Err(schema(name, &message));
        }
    }
    Ok(())
}

fn schema(template: &str, message: &str) -> IntentError {
    IntentError::Schema {
        template: template.to_string(),
        message: message.to_string(),
    }
}
