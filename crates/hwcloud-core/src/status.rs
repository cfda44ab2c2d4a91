//! Remote status classification
//!
//! Every remote domain reports its lifecycle as a native label ("starting",
//! "scaling-out", order status "5", ...). The classifier turns such a label
//! into a [`StatusKind`] using the label sets carried by a [`PollSpec`].

use crate::error::ErrorDetail;
use crate::poller::{Completion, PollSpec};
use serde::{Deserialize, Serialize};

/// Abstract classification of a single probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The operation is still in flight
    Pending,
    /// The operation reached its target state
    Target,
    /// The resource reported a terminal failure
    Error,
    /// The resource no longer exists (only when deletion is expected)
    Gone,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::Pending => write!(f, "pending"),
            StatusKind::Target => write!(f, "target"),
            StatusKind::Error => write!(f, "error"),
            StatusKind::Gone => write!(f, "gone"),
        }
    }
}

/// Result of classifying one remote observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub kind: StatusKind,

    /// Native label as reported by the remote side (`None` when not found)
    pub label: Option<String>,

    /// Last fetched remote record
    pub raw: Option<serde_json::Value>,

    /// Terminal error detail, set only for [`StatusKind::Error`]
    pub detail: Option<ErrorDetail>,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        self.kind != StatusKind::Pending
    }

    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("not-found")
    }
}

/// What a probe observed on the remote side, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteState {
    Found {
        label: String,
        raw: serde_json::Value,
        detail: Option<ErrorDetail>,
    },
    NotFound,
}

impl RemoteState {
    pub fn found(label: impl Into<String>, raw: serde_json::Value) -> Self {
        RemoteState::Found {
            label: label.into(),
            raw,
            detail: None,
        }
    }

    pub fn with_detail(self, detail: ErrorDetail) -> Self {
        match self {
            RemoteState::Found { label, raw, .. } => RemoteState::Found {
                label,
                raw,
                detail: Some(detail),
            },
            RemoteState::NotFound => RemoteState::NotFound,
        }
    }
}

/// Classify a remote observation against the label sets of `spec`.
///
/// Labels outside all three sets are treated as errors: an unexpected
/// state means the remote operation took a path the caller did not plan for.
pub fn classify(spec: &PollSpec, state: RemoteState) -> Status {
    match state {
        RemoteState::NotFound => match spec.completion() {
            Completion::Deletion => Status {
                kind: StatusKind::Gone,
                label: None,
                raw: None,
                detail: None,
            },
            Completion::Target => Status {
                kind: StatusKind::Error,
                label: None,
                raw: None,
                detail: Some(ErrorDetail::new(
                    "NOT_FOUND",
                    "resource disappeared while waiting for it to become ready",
                )),
            },
        },
        RemoteState::Found { label, raw, detail } => {
            let (kind, detail) = if spec.target().contains(&label) {
                (StatusKind::Target, None)
            } else if spec.pending().contains(&label) {
                (StatusKind::Pending, None)
            } else if spec.fatal().contains(&label) {
                let detail =
                    detail.unwrap_or_else(|| ErrorDetail::new("FATAL_STATE", label.clone()));
                (StatusKind::Error, Some(detail))
            } else {
                let detail = ErrorDetail::new(
                    "UNEXPECTED_STATE",
                    format!(
                        "unexpected state '{}', wanted one of {:?}",
                        label,
                        spec.target()
                    ),
                );
                (StatusKind::Error, Some(detail))
            };

            Status {
                kind,
                label: Some(label),
                raw: Some(raw),
                detail,
            }
        }
    }
}
