//! Orchestration of one user-facing action
//!
//! ```text
//! Planning ──► [Checking] ──► Submitting ──► [AwaitingPayment] ──► Polling ──► Completed
//!     │            │             │                │                  │
//!     └────────────┴─────────────┴────────────────┴──────────────────┴──► Failed
//! ```
//!
//! Every action issues exactly one mutating call, plus one payment call when
//! the submit answer carries an order the service does not pay itself.
//! Failures before Polling never start a poll; failures during Polling leave
//! the remote outcome unresolved and are reported as-is.
//!
//! A timed-out action may still be running remotely. Strategies acting on an
//! existing resource therefore read its state under the lock first
//! ([`ActionStrategy::precheck`]) and only submit when it is settled.

use crate::action::{ActionKind, OperationHandle, Outcome, Phase, Submitted};
use crate::error::CloudError;
use crate::lock::LockTable;
use crate::poller::{PollSpec, poll_to_completion};
use crate::probe::StatusProbe;
use crate::status::StatusKind;
use crate::transport::Billing;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Status read of an existing resource before the mutating call
pub struct Precheck<'a> {
    pub probe: Box<dyn StatusProbe + 'a>,
    /// Target labels accept a new call; pending labels mean an earlier
    /// operation has not settled yet
    pub spec: PollSpec,
}

/// Action-specific behaviour plugged into the [`Orchestrator`]
#[async_trait]
pub trait ActionStrategy: Send + Sync {
    /// User-level input of the action
    type Request: Send + Sync;
    /// Validated request body sent to the remote API
    type Payload: Send + Sync;

    fn kind(&self, request: &Self::Request) -> ActionKind;

    /// Resource to serialize on; `None` when the resource does not exist yet
    fn lock_key(&self, request: &Self::Request) -> Option<String>;

    /// Validate and shape the request; `None` means there is nothing to do
    fn build_request(&self, request: &Self::Request) -> crate::Result<Option<Self::Payload>>;

    /// Read of the resource run under the lock before submitting; `None`
    /// submits without looking
    fn precheck(&self, _request: &Self::Request) -> crate::Result<Option<Precheck<'_>>> {
        Ok(None)
    }

    /// Issue the mutating call
    async fn submit(&self, payload: &Self::Payload) -> crate::Result<Submitted>;

    /// Probe tracking the primary resource behind `handle`
    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_>;

    /// Label sets and timing for the completion poll
    fn poll_spec(&self, timeout: Duration) -> crate::Result<PollSpec>;

    /// Whether disappearance of the resource counts as success
    fn expected_completion_is_deletion(&self) -> bool {
        false
    }

    /// Whether the real resource ID is only known once the order completes
    fn resolves_handle_from_order(&self) -> bool {
        false
    }
}

/// Failed orchestration with the phase it failed in
#[derive(Error, Debug)]
#[error("{action} failed while {phase}: {source}")]
pub struct ActionFailure {
    pub action: ActionKind,
    pub phase: Phase,
    /// Handle of the submitted operation, if the submit call went through
    pub handle: Option<OperationHandle>,
    pub source: CloudError,
}

impl ActionFailure {
    fn new(
        action: ActionKind,
        phase: Phase,
        handle: Option<&OperationHandle>,
        source: CloudError,
    ) -> Self {
        Self {
            action,
            phase,
            handle: handle.cloned(),
            source,
        }
    }

    pub fn cause(&self) -> &CloudError {
        &self.source
    }

    pub fn into_cause(self) -> CloudError {
        self.source
    }
}

/// Drives actions through submit, payment and polling
pub struct Orchestrator<'a> {
    locks: &'a LockTable,
    billing: Option<Arc<dyn Billing>>,
}

impl Default for Orchestrator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator<'static> {
    /// Orchestrator using the process-wide lock table
    pub fn new() -> Self {
        Self {
            locks: LockTable::global(),
            billing: None,
        }
    }
}

impl<'a> Orchestrator<'a> {
    /// Orchestrator using a caller-owned lock table
    pub fn with_locks(locks: &'a LockTable) -> Self {
        Self {
            locks,
            billing: None,
        }
    }

    pub fn with_billing(mut self, billing: Arc<dyn Billing>) -> Self {
        self.billing = Some(billing);
        self
    }

    /// Execute one action to a terminal outcome.
    ///
    /// `timeout` bounds the completion poll and each billing wait. On timeout
    /// the remote operation is not cancelled: it may still complete later.
    pub async fn execute<S>(
        &self,
        strategy: &S,
        request: &S::Request,
        timeout: Duration,
    ) -> Result<Outcome, ActionFailure>
    where
        S: ActionStrategy,
    {
        let action = strategy.kind(request);

        let planned = strategy
            .build_request(request)
            .and_then(|payload| Ok((payload, strategy.poll_spec(timeout)?)));
        let (payload, spec) = match planned {
            Ok((Some(payload), spec)) => (payload, spec),
            Ok((None, _)) => {
                tracing::info!(%action, "No change requested, skipping");
                return Ok(Outcome::NoChange);
            }
            Err(err) => return Err(ActionFailure::new(action, Phase::Planning, None, err)),
        };
        let spec = if strategy.expected_completion_is_deletion() {
            spec.into_deletion()
        } else {
            spec
        };

        let lock_key = strategy.lock_key(request);
        let _guard = match &lock_key {
            Some(key) => Some(self.locks.lock(key).await),
            None => None,
        };

        let precheck = strategy
            .precheck(request)
            .map_err(|err| ActionFailure::new(action, Phase::Checking, None, err))?;
        if let Some(check) = precheck {
            ensure_settled(check, timeout)
                .await
                .map_err(|err| ActionFailure::new(action, Phase::Checking, None, err))?;
        }

        tracing::info!(%action, resource = lock_key.as_deref(), "Submitting");
        let submitted = strategy
            .submit(&payload)
            .await
            .map_err(|err| ActionFailure::new(action, Phase::Submitting, None, err))?;
        let mut handle = submitted.handle;

        if let Some(order_id) = submitted.order_id {
            tracing::info!(
                %action,
                %handle,
                order_id = %order_id,
                auto_paid = submitted.auto_paid,
                "Awaiting payment"
            );
            handle = self
                .settle_order(strategy, &order_id, submitted.auto_paid, handle.clone(), timeout)
                .await
                .map_err(|err| {
                    ActionFailure::new(action, Phase::AwaitingPayment, Some(&handle), err)
                })?;
        }

        tracing::info!(%action, %handle, "Polling for completion");
        let probe = strategy.probe(&handle);
        let status = poll_to_completion(probe.as_ref(), &spec)
            .await
            .map_err(|err| ActionFailure::new(action, Phase::Polling, Some(&handle), err))?;

        tracing::info!(%action, %handle, state = status.label_str(), "Completed");
        Ok(Outcome::Completed {
            action,
            handle,
            status,
            completed_at: Utc::now(),
        })
    }

    async fn settle_order<S>(
        &self,
        strategy: &S,
        order_id: &str,
        auto_paid: bool,
        handle: OperationHandle,
        timeout: Duration,
    ) -> crate::Result<OperationHandle>
    where
        S: ActionStrategy,
    {
        let billing = self.billing.as_deref().ok_or_else(|| {
            CloudError::invariant(format!(
                "operation returned order {} but no billing collaborator is configured",
                order_id
            ))
        })?;

        if !auto_paid {
            billing.pay_order(order_id).await?;
        }
        billing.wait_order_complete(order_id, timeout).await?;

        if strategy.resolves_handle_from_order() {
            let resource_id = billing.wait_order_resource(order_id, timeout).await?;
            return Ok(OperationHandle::new(resource_id));
        }
        Ok(handle)
    }
}

/// Fail unless `check` reads a target label
async fn ensure_settled(check: Precheck<'_>, timeout: Duration) -> crate::Result<()> {
    let resource_id = check.probe.resource_id().to_string();
    let status = match tokio::time::timeout(timeout, check.probe.probe(&check.spec)).await {
        Ok(status) => status?,
        Err(_) => {
            return Err(CloudError::Timeout {
                resource_id,
                elapsed: timeout,
                last_label: None,
                last_raw: None,
            });
        }
    };

    match status.kind {
        StatusKind::Target => {
            tracing::debug!(%resource_id, state = status.label_str(), "Resource is settled");
            Ok(())
        }
        StatusKind::Pending => Err(CloudError::invariant(format!(
            "{} is '{}': an earlier operation has not finished",
            resource_id,
            status.label_str()
        ))),
        StatusKind::Error | StatusKind::Gone => Err(CloudError::RemoteFatalState {
            resource_id,
            label: status.label_str().to_string(),
            detail: status.detail,
        }),
    }
}
