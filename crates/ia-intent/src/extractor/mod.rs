//! Variable extractor: pulls structured values out of free text.
//!
//! For every variable a template declares, the slot's candidate patterns are
//! tried in order and the first usable capture wins. Variables nothing
//! matched are left out of the result; checking required coverage is the
//! router's job. Extraction itself never fails.

pub mod patterns;

use std::sync::Arc;

use ia_protocol::VariableMap;

use crate::templates::TemplateRegistry;

pub use patterns::{Derivation, ExtractionPatternSet};

/// Extracts template variables from request text.
#[derive(Debug, Clone)]
pub struct VariableExtractor {
    registry: Arc<TemplateRegistry>,
    patterns: Arc<ExtractionPatternSet>,
}

impl VariableExtractor {
    pub fn new(registry: Arc<TemplateRegistry>, patterns: Arc<ExtractionPatternSet>) -> Self {
        Self { registry, patterns }
    }

    /// Extract every declared variable of `template_name` found in `text`.
    ///
    /// Unknown templates yield an empty map.
    pub fn extract(&self, text: &str, template_name: &str) -> VariableMap {
        let mut extracted = VariableMap::new();

        let Some(template) = self.registry.get(template_name) else {
            tracing::warn!(template = template_name, "extraction for unknown template");
            return extracted;
        };

        for var in template.all_vars() {
            match self.patterns.extract_one(text, var) {
                Ok(Some(value)) => {
                    extracted.insert(var.to_string(), value);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(template = template_name, var, error = %e, "no patterns for variable");
                }
            }
        }

        // Secondary signals, only for required variables still missing.
        for rule in self.patterns.derivations() {
            if !template.is_required(&rule.target) || extracted.contains_key(&rule.target) {
                continue;
            }
            if let Some(value) = rule.apply(text) {
                tracing::debug!(
                    template = template_name,
                    var = %rule.target,
                    value = %value,
                    "variable derived from secondary signal"
                );
                extracted.insert(rule.target.clone(), value);
            }
        }

        extracted
    }
}
