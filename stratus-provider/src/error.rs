//! Provider error types.

use thiserror::Error;

use crate::retry::StateTarget;

/// Errors that can occur while driving a resource through its lifecycle.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The wire payload could not be decoded at all (malformed structure).
    /// Per-field validation problems are reported as
    /// [`FieldFailure`](crate::property::FieldFailure)s instead, never as
    /// this variant.
    #[error("malformed payload: {0}")]
    Decode(String),

    /// Name resolution failed (empty or computed from unknown outputs).
    #[error("name resolution failed: {0}")]
    Name(String),

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A fatal error returned by the remote cloud API. Transient conditions
    /// ("not found" while waiting for creation) are absorbed by the retry
    /// loop and never surface here.
    #[error("remote API error: {0}")]
    Remote(String),

    /// The convergence-polling budget was exhausted before the resource
    /// reached the intended state.
    #[error("resource '{id}' did not become {target}")]
    Convergence { id: String, target: StateTarget },

    /// A caller broke the provider contract (kind-token mismatch, update
    /// with an un-replaced replace-class change). Programming error, not a
    /// user-facing failure.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
