//! # Error Types
//!
//! Classified errors for every call the reconciler makes against the cluster, the AKS
//! management plane and the Azure DevOps agent service.
//!
//! The reconciler only needs to know which bucket a failure falls into:
//!
//! - `NotFound` - sometimes benign (nothing to delete), sometimes an inconsistency
//! - `Conflict` - concurrent modification, retried on the next pass
//! - `Status` / `Transport` / `Kube` - the current step fails
//! - `Malformed` / `Validation` - bad persisted data or a bad campaign spec
//! - `Precondition` - the pool is busy, try again shortly

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("conflicting modification of {0}")]
    Conflict(String),

    #[error("{operation} failed: HTTP {status} - {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("{operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("malformed {what}: {message}")]
    Malformed { what: String, message: String },

    #[error("precondition not met: {0}")]
    Precondition(String),

    #[error("invalid campaign: {0}")]
    Validation(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    /// Another actor modified the object first; re-derive state next pass
    Retryable,
    Transport,
    Malformed,
    Precondition,
}

impl ErrorKind {
    /// Label value for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Retryable => "retryable",
            ErrorKind::Transport => "transport",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Precondition => "precondition",
        }
    }
}

impl Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn malformed(what: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Malformed {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn transport(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Transport {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Retryable,
            Error::Status { status: 404, .. } => ErrorKind::NotFound,
            Error::Status { status: 409, .. } => ErrorKind::Retryable,
            Error::Status { .. } | Error::Transport { .. } => ErrorKind::Transport,
            Error::Kube(kube::Error::Api(api_err)) if api_err.code == 404 => ErrorKind::NotFound,
            Error::Kube(kube::Error::Api(api_err)) if api_err.code == 409 => {
                ErrorKind::Retryable
            }
            Error::Kube(_) => ErrorKind::Transport,
            Error::Malformed { .. } | Error::Validation(_) => ErrorKind::Malformed,
            Error::Precondition(_) => ErrorKind::Precondition,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retryable
    }

    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }
}
