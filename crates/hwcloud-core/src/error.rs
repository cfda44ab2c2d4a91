//! Reconciliation error types

use std::time::Duration;
use thiserror::Error;

/// Errors produced while driving a remote operation to completion
#[derive(Error, Debug)]
pub enum CloudError {
    /// Network-level failure (connection reset, DNS, TLS, request timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success HTTP status
    #[error("API error (HTTP {status}): [{code}] {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The remote resource reported a terminal failure label
    #[error("Resource {resource_id} reached fatal state '{label}'{}", detail_suffix(.detail))]
    RemoteFatalState {
        resource_id: String,
        label: String,
        detail: Option<ErrorDetail>,
    },

    /// Polling budget exhausted while the resource was still pending
    #[error(
        "Timeout after {elapsed:?} waiting for resource {resource_id} (last state: {})",
        label_or_none(.last_label)
    )]
    Timeout {
        resource_id: String,
        elapsed: Duration,
        last_label: Option<String>,
        last_raw: Option<serde_json::Value>,
    },

    /// A local precondition failed before any remote call was made
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn invariant(message: impl Into<String>) -> Self {
        CloudError::InvariantViolation(message.into())
    }

    /// Whether the Poller may retry the probe that produced this error.
    ///
    /// Network failures, throttling and server-side errors are transient;
    /// everything else aborts the poll.
    pub fn is_retryable(&self) -> bool {
        match self {
            CloudError::Transport(_) => true,
            CloudError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this is a "resource does not exist" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Api { status: 404, .. })
    }
}

/// Terminal error detail reported by the remote side
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

fn detail_suffix(detail: &Option<ErrorDetail>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

fn label_or_none(label: &Option<String>) -> &str {
    label.as_deref().unwrap_or("none")
}

pub type Result<T> = std::result::Result<T, CloudError>;
