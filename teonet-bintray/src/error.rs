//! Publisher error types.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// A filename that cannot be mapped to a release target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("{file}: cannot determine repository for '{ext}' package")]
    UnknownFamily { file: String, ext: String },

    #[error("{file}: unknown distribution '{distro}'")]
    UnknownDistribution { file: String, distro: String },

    #[error("{file}: malformed package name ({reason})")]
    MalformedName { file: String, reason: &'static str },

    #[error("invalid version '{version}'")]
    InvalidVersion { version: String },

    #[error("unknown repository kind '{0}'")]
    UnknownRepoKind(String),
}

/// Errors raised by publisher operations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("HTTP ERROR \"{url}\" {status} {reason}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("nothing to publish in '{}'", .0.display())]
    NothingToPublish(PathBuf),
}

impl PublishError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PublishError::Config(_) => 2,
            PublishError::Classification(_) | PublishError::NothingToPublish(_) => 3,
            PublishError::Http { .. } => 10,
            PublishError::Transport(_)
            | PublishError::Io { .. }
            | PublishError::InvalidUrl(_)
            | PublishError::InvalidHeader(_) => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }
}
