//! Source acquisition error types.

use super::descriptor::{ChecksumAlgorithm, ProvenanceMode};
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`SourceManager::fetch_source`](super::SourceManager::fetch_source)
/// and the individual fetch handlers.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The descriptor is structurally invalid. Retrying will not help.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{mode} fetch failed: {cause}")]
    Fetch {
        mode: ProvenanceMode,
        #[source]
        cause: FetchCause,
    },

    #[error(
        "{algorithm} integrity check failed for '{}'\n  expected: {expected}\n  got:      {actual}",
        path.display()
    )]
    Verification {
        path: PathBuf,
        algorithm: ChecksumAlgorithm,
        expected: String,
        actual: String,
    },
}

/// Why a handler could not materialize its descriptor.
#[derive(Error, Debug)]
pub enum FetchCause {
    #[error("not implemented for this transport: {0}")]
    UnsupportedTransport(String),

    #[error("unsupported archive extension: {0}")]
    UnsupportedExtension(String),

    #[error("source path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("git: {0}")]
    Git(String),

    #[error("unsafe archive entry: {0}")]
    UnsafeEntry(String),

    #[error("archive error: {0}")]
    Archive(String),
}

impl FetchCause {
    /// Shorthand for wrapping an I/O error with a description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for transports and formats this crate does not handle at all.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedTransport(_) | Self::UnsupportedExtension(_)
        )
    }

    /// True when the same request could plausibly succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { .. } | Self::Transport(_) | Self::Git(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl SourceError {
    pub(crate) fn fetch(mode: ProvenanceMode, cause: FetchCause) -> Self {
        Self::Fetch { mode, cause }
    }

    /// The provenance mode of a fetch failure, if this is one.
    pub fn mode(&self) -> Option<ProvenanceMode> {
        match self {
            Self::Fetch { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    /// Whether a caller-level retry is worth attempting.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { cause, .. } => cause.is_transient(),
            Self::Configuration(_) | Self::Verification { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_not_retryable() {
        let err = SourceError::fetch(
            ProvenanceMode::Network,
            FetchCause::UnsupportedTransport("smb".into()),
        );
        assert!(!err.is_retryable());
        assert_eq!(err.mode(), Some(ProvenanceMode::Network));
        assert!(err.to_string().contains("not implemented for this transport: smb"));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = SourceError::fetch(
            ProvenanceMode::Archive,
            FetchCause::Http {
                url: "https://mirror.lan/a.tar.gz".into(),
                status: 503,
            },
        );
        assert!(err.is_retryable());

        let err = SourceError::fetch(
            ProvenanceMode::Archive,
            FetchCause::Http {
                url: "https://mirror.lan/a.tar.gz".into(),
                status: 404,
            },
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_verification_message() {
        let err = SourceError::Verification {
            path: PathBuf::from("/tmp/a.tar.gz"),
            algorithm: ChecksumAlgorithm::Sha256,
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SHA256 integrity check failed"));
        assert!(msg.contains("expected: aa"));
        assert!(!err.is_retryable());
        assert_eq!(err.mode(), None);
    }
}
