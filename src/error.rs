//! Error types for kube-expose.

use std::time::Duration;

use crate::discovery::BackendError;
use crate::port_map::PortMapError;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cluster backend failed for a reason other than an expired
    /// continuation token. No partial results accompany this error.
    #[error("{context}: {source}")]
    Backend {
        /// The operation that failed.
        context: &'static str,
        /// Underlying backend failure.
        #[source]
        source: BackendError,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The overall deadline elapsed before the operation finished.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Kubernetes client error.
    #[error("Kubernetes client error: {0}")]
    Kube(#[from] kube::Error),

    /// Tonic transport error.
    #[error("Tonic transport error: {0}")]
    TonicTransport(#[from] tonic::transport::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed port map entry.
    #[error(transparent)]
    PortMap(#[from] PortMapError),
}

impl Error {
    /// Wrap a backend failure with the name of the failing operation.
    pub fn backend(context: &'static str, source: BackendError) -> Self {
        Self::Backend { context, source }
    }

    /// True if this error came from caller cancellation or a deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }
}
