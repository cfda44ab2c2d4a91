//! HuaweiCloud asynchronous operation reconciliation
//!
//! Drives long-running, eventually-consistent remote operations (cluster
//! creation, node group scaling, order payment, termination) to a terminal
//! state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Orchestrator::execute              │
//! │  plan ─► lock ─► check ─► submit ─► pay ─► poll │
//! └───────┬──────────────┬───────────────┬──────────┘
//!         │              │               │
//! ┌───────▼──────┐ ┌─────▼─────┐ ┌───────▼────────┐
//! │ ActionStrategy│ │ LockTable │ │     Poller     │
//! │ (per action) │ │ (per ID)  │ │ + StatusProbe  │
//! └───────┬──────┘ └───────────┘ └───────┬────────┘
//!         │                              │
//! ┌───────▼──────────────────────────────▼────────┐
//! │        Transport / Billing collaborators       │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hwcloud_core::Orchestrator;
//! use std::time::Duration;
//!
//! let orchestrator = Orchestrator::new().with_billing(billing);
//! let outcome = orchestrator
//!     .execute(&resize_strategy, &request, Duration::from_secs(3600))
//!     .await?;
//! ```

pub mod action;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod poller;
pub mod probe;
pub mod resize;
pub mod status;
pub mod transport;

// Re-exports
pub use action::{ActionKind, OperationHandle, Outcome, Phase, Submitted};
pub use error::{CloudError, ErrorDetail, Result};
pub use lock::{LockTable, ResourceGuard};
pub use orchestrator::{ActionFailure, ActionStrategy, Orchestrator, Precheck};
pub use poller::{Completion, PollSpec, PollSpecBuilder, poll_to_completion};
pub use probe::{FnProbe, StatusProbe};
pub use resize::{
    Delta, GroupSize, MemberSpec, ResizeRequest, ScaleDirection, compute_delta, custom_deltas,
};
pub use status::{RemoteState, Status, StatusKind, classify};
pub use transport::{Billing, Method, Transport};
