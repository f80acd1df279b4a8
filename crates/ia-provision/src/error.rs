//! Provisioning error types.

use thiserror::Error;

/// Errors a provisioning function can raise.
///
/// The router converts every one of these into a `DispatchError` outcome.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("invalid {name} '{value}': {reason}")]
    InvalidArgument {
        name: String,
        value: String,
        reason: String,
    },

    #[error("provisioning backend error: {0}")]
    Backend(String),
}

/// Convenience alias for provisioning results.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
