//! Request understanding for infrastructure provisioning.
//!
//! Turns free text ("create a GCS bucket called logs in project acme-prod")
//! into a template name plus a map of extracted variables:
//!
//! - **Keyword matching** (local): whole-word keyword scoring per template.
//! - **Semantic classification** (remote): zero-shot fallback when keyword
//!   confidence is low.
//! - **Variable extraction**: ordered, first-match-wins patterns per slot.
//!
//! The template registry and extraction pattern set are plain data, loaded
//! once and shared read-only.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod keyword;
pub mod pattern;
pub mod templates;

pub use classifier::{
    HttpZeroShotClient, LabelScore, LabelTemplate, SemanticClassifier, StaticClassifier,
    ZeroShotClassifier, ZeroShotConfig,
};
pub use error::{ClassifierError, IntentError, IntentResult};
pub use extractor::{ExtractionPatternSet, VariableExtractor};
pub use keyword::KeywordMatcher;
pub use pattern::{RegexPattern, TextPattern};
pub use templates::{TemplateDefinition, TemplateRegistry};
