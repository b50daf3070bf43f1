use thiserror::Error;

/// Failures reported by the request lifecycle.
///
/// A transition that is simply not allowed (wrong owner, request no
/// longer pending, unknown id) is not an error: it comes back as
/// `Ok(false)` from `accept`, `decline` and `cancel`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A pending connection request or a relationship already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed role pair or missing/oversized fields.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Storage failure. The caller must not assume any state changed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RequestResult<T> = Result<T, RequestError>;
