use thiserror::Error;

use std::{error::Error as StdError, path::PathBuf};

#[derive(Debug, Error)]
pub enum FocusLockError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("no blockable category selected")]
    NoSelection,

    #[error("upstream {operation} request failed: {source}")]
    UpstreamRequest {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream {operation} rejected with status {status}")]
    UpstreamRejected {
        operation: &'static str,
        status: u16,
        details: Vec<String>,
    },

    #[error("{failed} of {total} block rules could not be created")]
    PartialFailure { failed: usize, total: usize },

    #[error("reconciliation did not finish within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing setting '{name}' (set it in the config file or via {env})")]
    MissingSetting {
        name: &'static str,
        env: &'static str,
    },
}

impl FocusLockError {
    /// Shorthand for a required field that was missing or blank
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors the caller can correct by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NoSelection)
    }

    /// Upstream-provided detail lines, if any
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::UpstreamRejected { details, .. } => details.clone(),
            Self::UpstreamRequest { source, .. } => {
                let mut chain = Vec::new();
                let mut cause = StdError::source(source);
                while let Some(err) = cause {
                    chain.push(err.to_string());
                    cause = StdError::source(err);
                }
                chain
            }
            _ => Vec::new(),
        }
    }
}
