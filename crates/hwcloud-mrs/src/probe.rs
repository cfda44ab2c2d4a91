//! Cluster status probes

use crate::client::MrsClient;
use crate::cluster::{ClusterInfo, cluster_state};
use async_trait::async_trait;
use hwcloud_core::{ErrorDetail, RemoteState, Result, StatusProbe, Transport};

/// Labels derived by [`ComponentProbe`]
pub(crate) const COMPONENTS_INSTALLING: &str = "installing";
pub(crate) const COMPONENTS_INSTALLED: &str = "installed";

/// Attach the stage description as error detail for failure states
fn found(info: &ClusterInfo, label: &str, raw: serde_json::Value) -> RemoteState {
    let state = RemoteState::found(label, raw);
    match (&info.stage_desc, info.state.as_str()) {
        (Some(desc), cluster_state::FAILED | cluster_state::ABNORMAL) => {
            state.with_detail(ErrorDetail::new(info.state.clone(), desc.clone()))
        }
        _ => state,
    }
}

/// Reports the cluster state label; a 404 means the cluster is gone
pub struct ClusterStatusProbe<'a, T> {
    client: &'a MrsClient<T>,
    cluster_id: String,
}

impl<'a, T: Transport> ClusterStatusProbe<'a, T> {
    pub fn new(client: &'a MrsClient<T>, cluster_id: impl Into<String>) -> Self {
        Self {
            client,
            cluster_id: cluster_id.into(),
        }
    }
}

#[async_trait]
impl<T: Transport> StatusProbe for ClusterStatusProbe<'_, T> {
    fn resource_id(&self) -> &str {
        &self.cluster_id
    }

    async fn fetch(&self) -> Result<RemoteState> {
        let raw = match self.client.get_cluster_raw(&self.cluster_id).await {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => return Ok(RemoteState::NotFound),
            Err(err) => return Err(err),
        };
        let info = ClusterInfo::from_response(&raw)?;
        let label = info.state.clone();
        Ok(found(&info, &label, raw))
    }
}

/// Reports whether a set of components is installed on a cluster.
///
/// The label is `installed` once the cluster is running with every requested
/// component listed, `installing` before that. Cluster failure states are
/// passed through unchanged.
pub struct ComponentProbe<'a, T> {
    client: &'a MrsClient<T>,
    cluster_id: String,
    components: Vec<String>,
}

impl<'a, T: Transport> ComponentProbe<'a, T> {
    pub fn new(client: &'a MrsClient<T>, cluster_id: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            client,
            cluster_id: cluster_id.into(),
            components,
        }
    }

    fn derive_label(&self, info: &ClusterInfo) -> String {
        match info.state.as_str() {
            cluster_state::FAILED | cluster_state::ABNORMAL | cluster_state::TERMINATED => {
                info.state.clone()
            }
            _ if info.is_running() && self.components.iter().all(|c| info.has_component(c)) => {
                COMPONENTS_INSTALLED.to_string()
            }
            _ => COMPONENTS_INSTALLING.to_string(),
        }
    }
}

#[async_trait]
impl<T: Transport> StatusProbe for ComponentProbe<'_, T> {
    fn resource_id(&self) -> &str {
        &self.cluster_id
    }

    async fn fetch(&self) -> Result<RemoteState> {
        let raw = match self.client.get_cluster_raw(&self.cluster_id).await {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => return Ok(RemoteState::NotFound),
            Err(err) => return Err(err),
        };
        let info = ClusterInfo::from_response(&raw)?;
        let label = self.derive_label(&info);
        tracing::debug!(
            cluster_id = %self.cluster_id,
            state = %info.state,
            %label,
            "Component installation status"
        );
        Ok(found(&info, &label, raw))
    }
}
