//! Request-understanding error types.

use thiserror::Error;

/// Errors raised while loading the template registry or pattern set.
///
/// These only occur at startup; per-request processing never fails.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid template '{template}': {message}")]
    Schema { template: String, message: String },

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("no extraction patterns for variable '{0}'")]
    UnknownVariable(String),
}

/// Convenience alias for registry and pattern loading results.
pub type IntentResult<T> = Result<T, IntentError>;

/// Errors from the external zero-shot classification capability.
///
/// Never escapes the classifier adapter; it degrades to a zero-confidence
/// result instead.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier HTTP error: {0}")]
    Http(String),

    #[error("failed to decode classifier response: {0}")]
    Decode(String),
}
