//! MRS API calls

use crate::cluster::{ClusterInfo, ClusterSpec};
use hwcloud_core::{CloudError, Method, ResizeRequest, Result, Transport};
use serde_json::{Value, json};

/// Fixed node ID the resize API expects
const RESIZE_NODE_ID: &str = "node_orderadd";

pub(crate) fn cluster_info_path(cluster_id: &str) -> String {
    format!("v1.1/{{project_id}}/cluster_infos/{}", cluster_id)
}

fn cluster_path(cluster_id: &str) -> String {
    format!("v1.1/{{project_id}}/clusters/{}", cluster_id)
}

fn components_path(cluster_id: &str) -> String {
    format!("v2/{{project_id}}/clusters/{}/components", cluster_id)
}

/// Answer of a cluster creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCluster {
    /// Cluster ID; prepaid clusters only get one once their order completes
    pub cluster_id: Option<String>,
    pub order_id: Option<String>,
}

/// Thin client for the MRS endpoints used by the cluster actions
pub struct MrsClient<T> {
    transport: T,
}

impl<T: Transport> MrsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Raw cluster record
    pub async fn get_cluster_raw(&self, cluster_id: &str) -> Result<Value> {
        self.transport.get(&cluster_info_path(cluster_id)).await
    }

    pub async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterInfo> {
        let response = self.get_cluster_raw(cluster_id).await?;
        ClusterInfo::from_response(&response)
    }

    pub async fn create_cluster(&self, spec: &ClusterSpec) -> Result<CreatedCluster> {
        let body = serde_json::to_value(spec)?;
        let response = self
            .transport
            .submit(Method::Post, "v2/{project_id}/clusters", &body)
            .await?;

        let created = CreatedCluster {
            cluster_id: non_empty_str(&response, "cluster_id"),
            order_id: non_empty_str(&response, "order_id"),
        };
        if created.cluster_id.is_none() && created.order_id.is_none() {
            return Err(CloudError::Api {
                status: 200,
                code: String::new(),
                message: format!("cluster creation returned neither cluster nor order: {}", response),
            });
        }
        Ok(created)
    }

    /// Submit one group resize; returns the order ID when the resize is billed
    pub async fn resize(&self, cluster_id: &str, request: &ResizeRequest) -> Result<Option<String>> {
        let response = self
            .transport
            .submit(Method::Put, &cluster_info_path(cluster_id), &resize_body(request))
            .await?;
        Ok(non_empty_str(&response, "order_id"))
    }

    pub async fn delete_cluster(&self, cluster_id: &str) -> Result<()> {
        self.transport
            .request(Method::Delete, &cluster_path(cluster_id), None)
            .await?;
        Ok(())
    }

    pub async fn add_components(&self, cluster_id: &str, components: &[String]) -> Result<()> {
        let install: Vec<Value> = components
            .iter()
            .map(|name| json!({ "component": name }))
            .collect();
        self.transport
            .submit(
                Method::Post,
                &components_path(cluster_id),
                &json!({ "components_install_mode": install }),
            )
            .await?;
        Ok(())
    }
}

/// Body of `PUT v1.1/{project_id}/cluster_infos/{id}`
pub fn resize_body(request: &ResizeRequest) -> Value {
    let mut parameters = json!({
        "scale_type": request.direction.as_str(),
        "node_id": RESIZE_NODE_ID,
        "node_group": request.group,
        "instances": request.magnitude.to_string(),
    });
    if let Some(spec) = &request.new_member_spec {
        parameters["task_node_info"] = json!({
            "node_size": spec.flavor,
            "data_volume_type": spec.data_volume_type,
            "data_volume_size": spec.data_volume_size,
            "data_volume_count": spec.data_volume_count,
        });
    }

    json!({
        "service_id": "",
        "plan_id": "",
        "parameters": parameters,
    })
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
