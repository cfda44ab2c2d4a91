#![allow(dead_code)]

use async_trait::async_trait;
use hwcloud_core::{
    ActionKind, ActionStrategy, Billing, CloudError, MemberSpec, OperationHandle, PollSpec,
    Precheck, RemoteState, ResizeRequest, Result, StatusProbe, Submitted,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Step = dyn Fn(usize) -> Result<RemoteState> + Send + Sync;

/// Probe answering from a script indexed by tick (1-based)
pub struct ScriptedProbe {
    calls: Arc<AtomicUsize>,
    step: Box<Step>,
}

impl ScriptedProbe {
    pub fn new(step: impl Fn(usize) -> Result<RemoteState> + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            step: Box::new(step),
        }
    }

    /// Pending for `n` ticks, then target
    pub fn pending_then_target(n: usize) -> Self {
        Self::new(move |tick| {
            if tick <= n {
                Ok(RemoteState::found("scaling-out", json!({"tick": tick})))
            } else {
                Ok(RemoteState::found("running", json!({"tick": tick})))
            }
        })
    }

    pub fn with_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    fn resource_id(&self) -> &str {
        "cluster-1"
    }

    async fn fetch(&self) -> Result<RemoteState> {
        let tick = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.step)(tick)
    }
}

pub fn resize_spec() -> PollSpec {
    PollSpec::new(["scaling-out", "scaling-in"], ["running"])
        .with_fatal(["failed", "terminated"])
        .with_delay(Duration::from_secs(120))
        .with_interval(Duration::from_secs(15))
        .with_timeout(Duration::from_secs(3600))
        .build()
        .unwrap()
}

/// Billing collaborator recording its calls
#[derive(Default)]
pub struct StubBilling {
    pub fail_payment: bool,
    pub resource_id: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubBilling {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Billing for StubBilling {
    async fn pay_order(&self, order_id: &str) -> Result<()> {
        self.record(format!("pay:{}", order_id));
        if self.fail_payment {
            return Err(CloudError::Api {
                status: 400,
                code: "CBC.30000067".to_string(),
                message: "insufficient balance".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_order_complete(&self, order_id: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("wait:{}", order_id));
        Ok(())
    }

    async fn wait_order_resource(&self, order_id: &str, _timeout: Duration) -> Result<String> {
        self.record(format!("resource:{}", order_id));
        self.resource_id
            .clone()
            .ok_or_else(|| CloudError::invariant("no resource in order"))
    }

    async fn unsubscribe(&self, resource_ids: &[String]) -> Result<Vec<String>> {
        self.record(format!("unsubscribe:{}", resource_ids.join(",")));
        Ok(vec!["unsub-order".to_string()])
    }
}

/// Desired change of one group, as the declarative layer would hand it over
pub struct GroupChange {
    pub cluster_id: String,
    pub group: String,
    pub current: Option<u32>,
    pub desired: u32,
    pub member_spec: Option<MemberSpec>,
}

/// Resize strategy against scripted remote behaviour
pub struct StubResize {
    pub submits: AtomicUsize,
    pub probe_calls: Arc<AtomicUsize>,
    pub order_id: Option<String>,
    pub auto_paid: bool,
    pub probe_step: Arc<Step>,
    /// Cluster state read before submitting, when set
    pub current_state: Option<&'static str>,
    pub submitted: Mutex<Vec<ResizeRequest>>,
}

impl StubResize {
    pub fn new(probe_step: impl Fn(usize) -> Result<RemoteState> + Send + Sync + 'static) -> Self {
        Self {
            submits: AtomicUsize::new(0),
            probe_calls: Arc::new(AtomicUsize::new(0)),
            order_id: None,
            auto_paid: false,
            probe_step: Arc::new(probe_step),
            current_state: None,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_order(mut self, order_id: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self
    }

    pub fn auto_paid(mut self) -> Self {
        self.auto_paid = true;
        self
    }

    pub fn checking(mut self, state: &'static str) -> Self {
        self.current_state = Some(state);
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionStrategy for StubResize {
    type Request = GroupChange;
    type Payload = (String, ResizeRequest);

    fn kind(&self, request: &GroupChange) -> ActionKind {
        if request.desired >= request.current.unwrap_or(0) {
            ActionKind::Expand
        } else {
            ActionKind::Shrink
        }
    }

    fn lock_key(&self, request: &GroupChange) -> Option<String> {
        Some(request.cluster_id.clone())
    }

    fn build_request(&self, request: &GroupChange) -> Result<Option<Self::Payload>> {
        let planned = ResizeRequest::plan(
            request.group.clone(),
            request.current,
            request.desired,
            request.member_spec.clone(),
        )?;
        Ok(planned.map(|resize| (request.cluster_id.clone(), resize)))
    }

    async fn submit(&self, payload: &Self::Payload) -> Result<Submitted> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(payload.1.clone());
        let submitted = Submitted::new(OperationHandle::new(payload.0.clone()));
        Ok(match &self.order_id {
            Some(order) if self.auto_paid => submitted.with_order(order.clone()).auto_paid(),
            Some(order) => submitted.with_order(order.clone()),
            None => submitted,
        })
    }

    fn precheck(&self, _request: &GroupChange) -> Result<Option<Precheck<'_>>> {
        let Some(state) = self.current_state else {
            return Ok(None);
        };
        Ok(Some(Precheck {
            probe: Box::new(ScriptedProbe::new(move |_| {
                Ok(RemoteState::found(state, json!({"clusterState": state})))
            })),
            spec: resize_spec(),
        }))
    }

    fn probe(&self, _handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        let step = Arc::clone(&self.probe_step);
        Box::new(
            ScriptedProbe::new(move |tick| step(tick)).with_counter(Arc::clone(&self.probe_calls)),
        )
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        Ok(resize_spec().with_timeout(timeout))
    }
}
