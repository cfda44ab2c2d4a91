//! Action types for remote operation orchestration

use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-facing action driven by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create a new resource
    Create,
    /// Grow a node group
    Expand,
    /// Shrink a node group
    Shrink,
    /// Install additional components on a cluster
    AddComponent,
    /// Delete a pay-per-use resource
    Delete,
    /// Unsubscribe a prepaid resource
    Unsubscribe,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Expand => write!(f, "expand"),
            ActionKind::Shrink => write!(f, "shrink"),
            ActionKind::AddComponent => write!(f, "add-component"),
            ActionKind::Delete => write!(f, "delete"),
            ActionKind::Unsubscribe => write!(f, "unsubscribe"),
        }
    }
}

/// Phase of an orchestration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Local request building and validation, no remote call yet
    Planning,
    /// One status read, under the lock, before the mutating call
    Checking,
    /// The single mutating call
    Submitting,
    /// Order payment and billing completion
    AwaitingPayment,
    /// Waiting for the remote operation to finish
    Polling,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Planning => write!(f, "planning"),
            Phase::Checking => write!(f, "checking"),
            Phase::Submitting => write!(f, "submitting"),
            Phase::AwaitingPayment => write!(f, "awaiting payment"),
            Phase::Polling => write!(f, "polling"),
        }
    }
}

/// Opaque identifier of a submitted operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random correlation ID for APIs that return no natural handle
    pub fn correlation() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer of a successful submit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub handle: OperationHandle,

    /// Order created by the call; the operation starts once it completes
    pub order_id: Option<String>,

    /// The order is paid by the service itself
    pub auto_paid: bool,
}

impl Submitted {
    pub fn new(handle: OperationHandle) -> Self {
        Self {
            handle,
            order_id: None,
            auto_paid: false,
        }
    }

    pub fn with_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Skip the payment call for the order
    pub fn auto_paid(mut self) -> Self {
        self.auto_paid = true;
        self
    }
}

/// Terminal result of a successful orchestration
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The request described no change; nothing was submitted
    NoChange,
    Completed {
        action: ActionKind,
        handle: OperationHandle,
        status: Status,
        completed_at: DateTime<Utc>,
    },
}

impl Outcome {
    pub fn is_no_change(&self) -> bool {
        matches!(self, Outcome::NoChange)
    }

    pub fn handle(&self) -> Option<&OperationHandle> {
        match self {
            Outcome::NoChange => None,
            Outcome::Completed { handle, .. } => Some(handle),
        }
    }

    /// Final remote status (label and raw record)
    pub fn status(&self) -> Option<&Status> {
        match self {
            Outcome::NoChange => None,
            Outcome::Completed { status, .. } => Some(status),
        }
    }
}
