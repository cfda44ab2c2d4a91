//! Node group layout and resize planning

use hwcloud_core::{CloudError, GroupSize, MemberSpec, ResizeRequest, Result, custom_deltas};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ANALYSIS_CORE_GROUP: &str = "core_node_analysis_group";
pub const ANALYSIS_TASK_GROUP: &str = "task_node_analysis_group";
pub const STREAMING_CORE_GROUP: &str = "core_node_streaming_group";
pub const STREAMING_TASK_GROUP: &str = "task_node_streaming_group";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterType {
    Analysis,
    Streaming,
    /// Analysis and streaming groups in one cluster
    Mixed,
    /// User-named node groups
    Custom,
}

impl ClusterType {
    fn has_analysis_groups(&self) -> bool {
        matches!(self, ClusterType::Analysis | ClusterType::Mixed)
    }

    fn has_streaming_groups(&self) -> bool {
        matches!(self, ClusterType::Streaming | ClusterType::Mixed)
    }
}

impl FromStr for ClusterType {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ANALYSIS" => Ok(ClusterType::Analysis),
            "STREAMING" => Ok(ClusterType::Streaming),
            "MIXED" => Ok(ClusterType::Mixed),
            "CUSTOM" => Ok(ClusterType::Custom),
            _ => Err(CloudError::invariant(format!("unknown cluster type '{}'", s))),
        }
    }
}

/// Task node group with the layout used when it is first populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNodes {
    pub node_number: u32,
    pub flavor: String,
    pub data_volume_type: String,
    pub data_volume_size: u32,
    pub data_volume_count: u32,
}

impl TaskNodes {
    pub fn member_spec(&self) -> MemberSpec {
        MemberSpec {
            flavor: self.flavor.clone(),
            data_volume_type: self.data_volume_type.clone(),
            data_volume_size: self.data_volume_size,
            data_volume_count: self.data_volume_count,
        }
    }
}

/// Desired node counts of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeLayout {
    pub analysis_core_nodes: Option<u32>,
    pub analysis_task_nodes: Option<TaskNodes>,
    pub streaming_core_nodes: Option<u32>,
    pub streaming_task_nodes: Option<TaskNodes>,
    pub custom_nodes: Vec<GroupSize>,
}

/// Change of one node group, before planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdate {
    pub group: String,
    /// `None` when the group had no prior configuration
    pub current: Option<u32>,
    pub desired: u32,
    pub member_spec: Option<MemberSpec>,
}

impl GroupUpdate {
    pub fn new(group: impl Into<String>, current: Option<u32>, desired: u32) -> Self {
        Self {
            group: group.into(),
            current,
            desired,
            member_spec: None,
        }
    }

    pub fn with_member_spec(mut self, spec: MemberSpec) -> Self {
        self.member_spec = Some(spec);
        self
    }

    pub fn is_growth(&self) -> bool {
        self.desired >= self.current.unwrap_or(0)
    }

    /// Validated resize, `None` when the count does not change
    pub fn plan(&self) -> Result<Option<ResizeRequest>> {
        ResizeRequest::plan(
            self.group.as_str(),
            self.current,
            self.desired,
            self.member_spec.clone(),
        )
    }
}

fn core_update(group: &str, old: Option<u32>, new: Option<u32>) -> Result<Option<GroupUpdate>> {
    match (old, new) {
        (_, None) if old.is_some() => Err(CloudError::invariant(format!(
            "core group '{}' cannot be removed",
            group
        ))),
        (_, None) => Ok(None),
        (old, Some(desired)) => Ok(Some(GroupUpdate::new(group, old, desired))),
    }
}

fn task_update(group: &str, old: Option<&TaskNodes>, new: Option<&TaskNodes>) -> Option<GroupUpdate> {
    let current = old.map(|t| t.node_number);
    match new {
        Some(task) => Some(GroupUpdate {
            group: group.to_string(),
            current,
            desired: task.node_number,
            member_spec: Some(task.member_spec()),
        }),
        None => current.map(|_| GroupUpdate::new(group, current, 0)),
    }
}

/// Plan the group resizes turning `old` into `new`.
///
/// Groups are visited analysis core, analysis task, streaming core,
/// streaming task, then custom groups in `new` order. Every change is
/// validated up front so an invalid layout fails before any group is
/// resized; unchanged groups are left out.
pub fn plan_node_updates(
    cluster_type: ClusterType,
    old: &NodeLayout,
    new: &NodeLayout,
) -> Result<Vec<GroupUpdate>> {
    let mut candidates = Vec::new();

    if cluster_type.has_analysis_groups() {
        candidates.extend(core_update(
            ANALYSIS_CORE_GROUP,
            old.analysis_core_nodes,
            new.analysis_core_nodes,
        )?);
        candidates.extend(task_update(
            ANALYSIS_TASK_GROUP,
            old.analysis_task_nodes.as_ref(),
            new.analysis_task_nodes.as_ref(),
        ));
    }
    if cluster_type.has_streaming_groups() {
        candidates.extend(core_update(
            STREAMING_CORE_GROUP,
            old.streaming_core_nodes,
            new.streaming_core_nodes,
        )?);
        candidates.extend(task_update(
            STREAMING_TASK_GROUP,
            old.streaming_task_nodes.as_ref(),
            new.streaming_task_nodes.as_ref(),
        ));
    }
    if cluster_type == ClusterType::Custom {
        for request in custom_deltas(&old.custom_nodes, &new.custom_nodes)? {
            let current = old
                .custom_nodes
                .iter()
                .find(|g| g.name == request.group)
                .map(|g| g.count);
            let desired = new
                .custom_nodes
                .iter()
                .find(|g| g.name == request.group)
                .map_or(0, |g| g.count);
            candidates.push(GroupUpdate::new(request.group, current, desired));
        }
    }

    let mut updates = Vec::new();
    for update in candidates {
        if update.plan()?.is_some() {
            updates.push(update);
        }
    }
    Ok(updates)
}
