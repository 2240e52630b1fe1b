//! Remote adapter error types.

use meshpair_domain::error::MeshError;

/// Errors specific to the remote hub client.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request could not be delivered (unreachable host, timeout, …).
    #[error("request to hub failed")]
    Http(#[source] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub returned status {0}")]
    Status(reqwest::StatusCode),

    /// The hub's response body could not be decoded.
    #[error("failed to decode hub response")]
    Decode(#[source] reqwest::Error),
}

impl RemoteError {
    /// Convert into a [`MeshError::Transport`] for propagation across the
    /// port boundary.
    #[must_use]
    pub fn into_domain(self) -> MeshError {
        MeshError::Transport(Box::new(self))
    }
}

impl From<RemoteError> for MeshError {
    fn from(err: RemoteError) -> Self {
        err.into_domain()
    }
}
