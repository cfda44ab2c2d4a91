//! MRS cluster records and request bodies

use hwcloud_core::{CloudError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cluster states reported by MRS
pub mod cluster_state {
    pub const STARTING: &str = "starting";
    pub const RUNNING: &str = "running";
    pub const SCALING_OUT: &str = "scaling-out";
    pub const SCALING_IN: &str = "scaling-in";
    pub const TERMINATING: &str = "terminating";
    pub const TERMINATED: &str = "terminated";
    pub const FAILED: &str = "failed";
    pub const ABNORMAL: &str = "abnormal";
}

/// Cluster as returned by `GET v1.1/{project_id}/cluster_infos/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(rename = "clusterId")]
    pub id: String,

    #[serde(rename = "clusterName", default)]
    pub name: String,

    #[serde(rename = "clusterState")]
    pub state: String,

    #[serde(rename = "clusterType", default)]
    pub cluster_type: Option<String>,

    #[serde(rename = "componentList", default)]
    pub components: Vec<ComponentInfo>,

    /// Progress or failure description of the current stage
    #[serde(rename = "stageDesc", default)]
    pub stage_desc: Option<String>,
}

impl ClusterInfo {
    /// Parse the `{"cluster": {...}}` envelope
    pub fn from_response(response: &Value) -> Result<Self> {
        let cluster = response.get("cluster").ok_or_else(|| CloudError::Api {
            status: 200,
            code: String::new(),
            message: "cluster response without 'cluster' object".to_string(),
        })?;
        Ok(serde_json::from_value(cluster.clone())?)
    }

    pub fn is_running(&self) -> bool {
        self.state == cluster_state::RUNNING
    }

    /// Whether a component with this name is installed (case-insensitive)
    pub fn has_component(&self, name: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(rename = "componentId", default)]
    pub id: String,

    #[serde(rename = "componentName")]
    pub name: String,

    #[serde(rename = "componentVersion", default)]
    pub version: Option<String>,
}

/// Cluster creation body (`POST v2/{project_id}/clusters`).
///
/// Only the fields this crate reasons about are typed; everything else is
/// passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub cluster_type: String,
    pub cluster_version: String,
    /// Comma-separated component names
    pub components: String,
    pub node_groups: Vec<NodeGroupSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_info: Option<ChargeInfo>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterSpec {
    pub fn is_prepaid(&self) -> bool {
        self.charge_info
            .as_ref()
            .is_some_and(|info| info.charge_mode == "prePaid")
    }

    /// Prepaid with the order paid by the service on creation
    pub fn is_auto_pay(&self) -> bool {
        self.is_prepaid()
            && self
                .charge_info
                .as_ref()
                .and_then(|info| info.is_auto_pay)
                .unwrap_or(false)
    }

    /// Reject bodies the service would refuse anyway
    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.trim().is_empty() {
            return Err(CloudError::invariant("cluster_name must not be empty"));
        }
        if self.components.trim().is_empty() {
            return Err(CloudError::invariant("at least one component is required"));
        }
        if self.node_groups.is_empty() {
            return Err(CloudError::invariant("at least one node group is required"));
        }
        if let Some(group) = self.node_groups.iter().find(|g| g.node_num == 0) {
            return Err(CloudError::invariant(format!(
                "node group '{}' must have at least one node",
                group.group_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroupSpec {
    pub group_name: String,
    pub node_num: u32,
    pub node_size: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeInfo {
    /// `postPaid` or `prePaid`
    pub charge_mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_num: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_pay: Option<bool>,
}
