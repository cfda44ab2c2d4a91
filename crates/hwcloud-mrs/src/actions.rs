//! Cluster actions run through the orchestrator

use crate::client::MrsClient;
use crate::cluster::{ClusterSpec, cluster_state};
use crate::nodes::GroupUpdate;
use crate::probe::{COMPONENTS_INSTALLED, COMPONENTS_INSTALLING, ClusterStatusProbe, ComponentProbe};
use async_trait::async_trait;
use hwcloud_core::{
    ActionFailure, ActionKind, ActionStrategy, Billing, CloudError, OperationHandle, Orchestrator,
    Outcome, PollSpec, Precheck, ResizeRequest, Result, StatusProbe, Submitted, Transport,
};
use std::sync::Arc;
use std::time::Duration;

const CREATE_DELAY: Duration = Duration::from_secs(480);
const CREATE_INTERVAL: Duration = Duration::from_secs(15);
const RESIZE_DELAY: Duration = Duration::from_secs(120);
const RESIZE_INTERVAL: Duration = Duration::from_secs(15);
const DELETE_DELAY: Duration = Duration::from_secs(45);
const UNSUBSCRIBE_DELAY: Duration = Duration::from_secs(15);
const DELETE_INTERVAL: Duration = Duration::from_secs(10);
const COMPONENT_DELAY: Duration = Duration::from_secs(60);
const COMPONENT_INTERVAL: Duration = Duration::from_secs(15);

/// Upper bound the service gives a single group resize
pub const RESIZE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const FATAL_STATES: [&str; 3] = [
    cluster_state::FAILED,
    cluster_state::ABNORMAL,
    cluster_state::TERMINATED,
];

/// A cluster accepts a new mutating call only while running
fn settled_spec() -> Result<PollSpec> {
    PollSpec::new(
        [
            cluster_state::STARTING,
            cluster_state::SCALING_OUT,
            cluster_state::SCALING_IN,
        ],
        [cluster_state::RUNNING],
    )
    .with_fatal([
        cluster_state::FAILED,
        cluster_state::ABNORMAL,
        cluster_state::TERMINATING,
        cluster_state::TERMINATED,
    ])
    .build()
}

fn running_precheck<'a, T: Transport>(
    client: &'a MrsClient<T>,
    cluster_id: &str,
) -> Result<Option<Precheck<'a>>> {
    Ok(Some(Precheck {
        probe: Box::new(ClusterStatusProbe::new(client, cluster_id)),
        spec: settled_spec()?,
    }))
}

fn deletion_spec(delay: Duration, timeout: Duration) -> Result<PollSpec> {
    PollSpec::new(
        [cluster_state::RUNNING, cluster_state::TERMINATING],
        [cluster_state::TERMINATED],
    )
    .with_fatal([cluster_state::FAILED])
    .with_delay(delay)
    .with_interval(DELETE_INTERVAL)
    .with_timeout(timeout)
    .expect_deletion()
    .build()
}

/// Existing cluster addressed by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRef {
    pub cluster_id: String,
}

impl ClusterRef {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a cluster and wait until it is running.
///
/// Prepaid clusters answer with an order; the cluster ID is only known once
/// the order has produced its resource.
pub struct CreateCluster<'a, T> {
    client: &'a MrsClient<T>,
}

impl<'a, T: Transport> CreateCluster<'a, T> {
    pub fn new(client: &'a MrsClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport> ActionStrategy for CreateCluster<'_, T> {
    type Request = ClusterSpec;
    type Payload = ClusterSpec;

    fn kind(&self, _request: &ClusterSpec) -> ActionKind {
        ActionKind::Create
    }

    fn lock_key(&self, _request: &ClusterSpec) -> Option<String> {
        None
    }

    fn build_request(&self, request: &ClusterSpec) -> Result<Option<ClusterSpec>> {
        request.validate()?;
        Ok(Some(request.clone()))
    }

    async fn submit(&self, payload: &ClusterSpec) -> Result<Submitted> {
        let created = self.client.create_cluster(payload).await?;
        let handle = match created.cluster_id {
            Some(id) => OperationHandle::new(id),
            None => OperationHandle::correlation(),
        };
        let submitted = Submitted::new(handle);
        Ok(match created.order_id {
            Some(order_id) if payload.is_auto_pay() => submitted.with_order(order_id).auto_paid(),
            Some(order_id) => submitted.with_order(order_id),
            None => submitted,
        })
    }

    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        Box::new(ClusterStatusProbe::new(self.client, handle.as_str()))
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        PollSpec::new([cluster_state::STARTING], [cluster_state::RUNNING])
            .with_fatal(FATAL_STATES)
            .with_delay(CREATE_DELAY)
            .with_interval(CREATE_INTERVAL)
            .with_timeout(timeout)
            .build()
    }

    fn resolves_handle_from_order(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

/// Resize of one node group of an existing cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResize {
    pub cluster_id: String,
    pub update: GroupUpdate,
}

impl GroupResize {
    pub fn new(cluster_id: impl Into<String>, update: GroupUpdate) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            update,
        }
    }
}

/// Expand or shrink a node group and wait until the cluster is running again.
///
/// The cluster must be running when the resize is submitted; a cluster still
/// scaling from an earlier call fails the action without a new resize.
pub struct ResizeGroup<'a, T> {
    client: &'a MrsClient<T>,
}

impl<'a, T: Transport> ResizeGroup<'a, T> {
    pub fn new(client: &'a MrsClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport> ActionStrategy for ResizeGroup<'_, T> {
    type Request = GroupResize;
    type Payload = (String, ResizeRequest);

    fn kind(&self, request: &GroupResize) -> ActionKind {
        if request.update.is_growth() {
            ActionKind::Expand
        } else {
            ActionKind::Shrink
        }
    }

    fn lock_key(&self, request: &GroupResize) -> Option<String> {
        Some(request.cluster_id.clone())
    }

    fn build_request(&self, request: &GroupResize) -> Result<Option<(String, ResizeRequest)>> {
        Ok(request
            .update
            .plan()?
            .map(|resize| (request.cluster_id.clone(), resize)))
    }

    fn precheck(&self, request: &GroupResize) -> Result<Option<Precheck<'_>>> {
        running_precheck(self.client, &request.cluster_id)
    }

    async fn submit(&self, payload: &(String, ResizeRequest)) -> Result<Submitted> {
        let (cluster_id, resize) = payload;
        tracing::info!(
            %cluster_id,
            group = %resize.group,
            scale_type = resize.direction.as_str(),
            instances = resize.magnitude.get(),
            "Resizing node group"
        );
        let order_id = self.client.resize(cluster_id, resize).await?;
        let submitted = Submitted::new(OperationHandle::new(cluster_id.as_str()));
        Ok(match order_id {
            Some(order_id) => submitted.with_order(order_id),
            None => submitted,
        })
    }

    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        Box::new(ClusterStatusProbe::new(self.client, handle.as_str()))
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        PollSpec::new(
            [cluster_state::SCALING_OUT, cluster_state::SCALING_IN],
            [cluster_state::RUNNING],
        )
        .with_fatal(FATAL_STATES)
        .with_delay(RESIZE_DELAY)
        .with_interval(RESIZE_INTERVAL)
        .with_timeout(timeout)
        .build()
    }
}

/// Apply planned group updates one after another.
///
/// Stops at the first failure; groups resized before it stay resized.
pub async fn resize_cluster_nodes<T: Transport>(
    orchestrator: &Orchestrator<'_>,
    client: &MrsClient<T>,
    cluster_id: &str,
    updates: Vec<GroupUpdate>,
    timeout: Duration,
) -> std::result::Result<Vec<Outcome>, ActionFailure> {
    let strategy = ResizeGroup::new(client);
    let mut outcomes = Vec::with_capacity(updates.len());
    for update in updates {
        let request = GroupResize::new(cluster_id, update);
        outcomes.push(orchestrator.execute(&strategy, &request, timeout).await?);
    }
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// Add components
// ---------------------------------------------------------------------------

/// Install components on a running cluster
pub struct AddComponents<'a, T> {
    client: &'a MrsClient<T>,
    components: Vec<String>,
}

impl<'a, T: Transport> AddComponents<'a, T> {
    /// Blank and duplicate (case-insensitive) component names are dropped
    pub fn new(client: &'a MrsClient<T>, components: &[String]) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for name in components {
            let name = name.trim();
            if !name.is_empty() && !unique.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                unique.push(name.to_string());
            }
        }
        Self {
            client,
            components: unique,
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

#[async_trait]
impl<T: Transport> ActionStrategy for AddComponents<'_, T> {
    type Request = ClusterRef;
    type Payload = String;

    fn kind(&self, _request: &ClusterRef) -> ActionKind {
        ActionKind::AddComponent
    }

    fn lock_key(&self, request: &ClusterRef) -> Option<String> {
        Some(request.cluster_id.clone())
    }

    fn build_request(&self, request: &ClusterRef) -> Result<Option<String>> {
        let cluster_id = non_blank_id(&request.cluster_id)?;
        if self.components.is_empty() {
            return Ok(None);
        }
        Ok(Some(cluster_id))
    }

    fn precheck(&self, request: &ClusterRef) -> Result<Option<Precheck<'_>>> {
        running_precheck(self.client, request.cluster_id.trim())
    }

    async fn submit(&self, cluster_id: &String) -> Result<Submitted> {
        tracing::info!(%cluster_id, components = ?self.components, "Adding components");
        self.client
            .add_components(cluster_id, &self.components)
            .await?;
        Ok(Submitted::new(OperationHandle::new(cluster_id.as_str())))
    }

    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        Box::new(ComponentProbe::new(
            self.client,
            handle.as_str(),
            self.components.clone(),
        ))
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        PollSpec::new([COMPONENTS_INSTALLING], [COMPONENTS_INSTALLED])
            .with_fatal(FATAL_STATES)
            .with_delay(COMPONENT_DELAY)
            .with_interval(COMPONENT_INTERVAL)
            .with_timeout(timeout)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Delete / unsubscribe
// ---------------------------------------------------------------------------

/// Delete a pay-per-use cluster and wait until it is gone
pub struct DeleteCluster<'a, T> {
    client: &'a MrsClient<T>,
}

impl<'a, T: Transport> DeleteCluster<'a, T> {
    pub fn new(client: &'a MrsClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport> ActionStrategy for DeleteCluster<'_, T> {
    type Request = ClusterRef;
    type Payload = String;

    fn kind(&self, _request: &ClusterRef) -> ActionKind {
        ActionKind::Delete
    }

    fn lock_key(&self, request: &ClusterRef) -> Option<String> {
        Some(request.cluster_id.clone())
    }

    fn build_request(&self, request: &ClusterRef) -> Result<Option<String>> {
        non_blank_id(&request.cluster_id).map(Some)
    }

    async fn submit(&self, cluster_id: &String) -> Result<Submitted> {
        self.client.delete_cluster(cluster_id).await?;
        Ok(Submitted::new(OperationHandle::new(cluster_id.as_str())))
    }

    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        Box::new(ClusterStatusProbe::new(self.client, handle.as_str()))
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        deletion_spec(DELETE_DELAY, timeout)
    }

    fn expected_completion_is_deletion(&self) -> bool {
        true
    }
}

/// Unsubscribe a prepaid cluster and wait until it is gone
pub struct UnsubscribeCluster<'a, T> {
    client: &'a MrsClient<T>,
    billing: Arc<dyn Billing>,
}

impl<'a, T: Transport> UnsubscribeCluster<'a, T> {
    pub fn new(client: &'a MrsClient<T>, billing: Arc<dyn Billing>) -> Self {
        Self { client, billing }
    }
}

#[async_trait]
impl<T: Transport> ActionStrategy for UnsubscribeCluster<'_, T> {
    type Request = ClusterRef;
    type Payload = String;

    fn kind(&self, _request: &ClusterRef) -> ActionKind {
        ActionKind::Unsubscribe
    }

    fn lock_key(&self, request: &ClusterRef) -> Option<String> {
        Some(request.cluster_id.clone())
    }

    fn build_request(&self, request: &ClusterRef) -> Result<Option<String>> {
        non_blank_id(&request.cluster_id).map(Some)
    }

    async fn submit(&self, cluster_id: &String) -> Result<Submitted> {
        let orders = self.billing.unsubscribe(std::slice::from_ref(cluster_id)).await?;
        tracing::info!(%cluster_id, orders = ?orders, "Unsubscribed cluster");
        Ok(Submitted::new(OperationHandle::new(cluster_id.as_str())))
    }

    fn probe(&self, handle: &OperationHandle) -> Box<dyn StatusProbe + '_> {
        Box::new(ClusterStatusProbe::new(self.client, handle.as_str()))
    }

    fn poll_spec(&self, timeout: Duration) -> Result<PollSpec> {
        deletion_spec(UNSUBSCRIBE_DELAY, timeout)
    }

    fn expected_completion_is_deletion(&self) -> bool {
        true
    }
}

fn non_blank_id(cluster_id: &str) -> Result<String> {
    let cluster_id = cluster_id.trim();
    if cluster_id.is_empty() {
        return Err(CloudError::invariant("cluster ID must not be empty"));
    }
    Ok(cluster_id.to_string())
}
