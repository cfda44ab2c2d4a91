mod common;

use common::{PROJECT_CLUSTER_INFO, Reply, StubTransport, cluster, empty};
use hwcloud_cbc::CbcClient;
use hwcloud_core::{
    ActionKind, CloudError, LockTable, Method, Orchestrator, Outcome, Phase, StatusKind,
};
use hwcloud_mrs::{
    AddComponents, ClusterRef, ClusterSpec, ClusterType, CreateCluster, DeleteCluster,
    GroupResize, GroupUpdate, MrsClient, NodeLayout, RESIZE_TIMEOUT, ResizeGroup,
    UnsubscribeCluster, plan_node_updates, resize_cluster_nodes,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DELETE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
const CREATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

fn core_resize(current: Option<u32>, desired: u32) -> GroupResize {
    GroupResize::new(
        "cluster-1",
        GroupUpdate::new("core_node_analysis_group", current, desired),
    )
}

fn cluster_spec(charge_mode: &str) -> ClusterSpec {
    serde_json::from_value(json!({
        "cluster_name": "mrs-demo",
        "cluster_type": "ANALYSIS",
        "cluster_version": "MRS 3.1.0",
        "components": "Hadoop,Spark2x",
        "node_groups": [
            {"group_name": "master_node_default_group", "node_num": 2, "node_size": "c6.4xlarge.4.linux.bigdata"},
            {"group_name": "core_node_analysis_group", "node_num": 3, "node_size": "c6.4xlarge.4.linux.bigdata"}
        ],
        "charge_info": {"charge_mode": charge_mode}
    }))
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_expand_core_group() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(Method::Put, PROJECT_CLUSTER_INFO, [Reply::Json(json!({"result": "succeeded"}))])
            .on(
                Method::Get,
                PROJECT_CLUSTER_INFO,
                [
                    cluster("running"),
                    cluster("scaling-out"),
                    cluster("scaling-out"),
                    cluster("running"),
                ],
            ),
    );
    let locks = LockTable::new();

    let start = Instant::now();
    let outcome = Orchestrator::with_locks(&locks)
        .execute(&ResizeGroup::new(&client), &core_resize(Some(3), 5), RESIZE_TIMEOUT)
        .await
        .unwrap();

    match outcome {
        Outcome::Completed { action, handle, status, .. } => {
            assert_eq!(action, ActionKind::Expand);
            assert_eq!(handle.as_str(), "cluster-1");
            assert_eq!(status.label.as_deref(), Some("running"));
        }
        Outcome::NoChange => panic!("expected a completed resize"),
    }
    assert_eq!(start.elapsed(), Duration::from_secs(120 + 2 * 15));

    let calls = client.transport().calls();
    assert_eq!(calls[0].method, Method::Get);
    assert_eq!(calls[1].method, Method::Put);
    assert_eq!(
        calls[1].body.as_ref().unwrap()["parameters"],
        json!({
            "scale_type": "scale_out",
            "node_id": "node_orderadd",
            "node_group": "core_node_analysis_group",
            "instances": "2"
        })
    );
    assert_eq!(client.transport().count(Method::Get, PROJECT_CLUSTER_INFO), 4);
}

#[tokio::test(start_paused = true)]
async fn test_resize_of_scaling_cluster_is_refused() {
    let client = MrsClient::new(StubTransport::new().on(
        Method::Get,
        PROJECT_CLUSTER_INFO,
        [cluster("scaling-out"), cluster("running")],
    ));
    let locks = LockTable::new();

    let failure = Orchestrator::with_locks(&locks)
        .execute(&ResizeGroup::new(&client), &core_resize(Some(3), 5), RESIZE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.phase, Phase::Checking);
    assert!(matches!(failure.cause(), CloudError::InvariantViolation(_)));
    assert!(failure.to_string().contains("scaling-out"));
    assert_eq!(client.transport().count(Method::Put, PROJECT_CLUSTER_INFO), 0);
    assert_eq!(client.transport().calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resize_of_missing_cluster_is_refused() {
    let client = MrsClient::new(StubTransport::new().on(
        Method::Get,
        PROJECT_CLUSTER_INFO,
        [Reply::Api(404, "MRS.0011")],
    ));

    let failure = Orchestrator::with_locks(&LockTable::new())
        .execute(&ResizeGroup::new(&client), &core_resize(Some(3), 5), RESIZE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.phase, Phase::Checking);
    assert!(matches!(failure.cause(), CloudError::RemoteFatalState { .. }));
    assert_eq!(client.transport().count(Method::Put, PROJECT_CLUSTER_INFO), 0);
}

#[tokio::test]
async fn test_unchanged_group_submits_nothing() {
    let client = MrsClient::new(StubTransport::new());

    let outcome = Orchestrator::with_locks(&LockTable::new())
        .execute(&ResizeGroup::new(&client), &core_resize(Some(4), 4), RESIZE_TIMEOUT)
        .await
        .unwrap();

    assert!(outcome.is_no_change());
    assert!(client.transport().calls().is_empty());
}

#[tokio::test]
async fn test_populating_empty_group_requires_layout() {
    let client = MrsClient::new(StubTransport::new());
    let request = GroupResize::new(
        "cluster-1",
        GroupUpdate::new("task_node_analysis_group", None, 4),
    );

    let failure = Orchestrator::with_locks(&LockTable::new())
        .execute(&ResizeGroup::new(&client), &request, RESIZE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.phase, Phase::Planning);
    assert!(matches!(failure.cause(), CloudError::InvariantViolation(_)));
    assert!(client.transport().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_cluster_fails_resize_with_detail() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(Method::Put, PROJECT_CLUSTER_INFO, [empty()])
            .on(
                Method::Get,
                PROJECT_CLUSTER_INFO,
                [
                    cluster("running"),
                    cluster("scaling-in"),
                    Reply::Json(json!({
                        "cluster": {
                            "clusterId": "cluster-1",
                            "clusterState": "abnormal",
                            "stageDesc": "Decommissioning DataNode failed"
                        }
                    })),
                ],
            ),
    );

    let failure = Orchestrator::with_locks(&LockTable::new())
        .execute(&ResizeGroup::new(&client), &core_resize(Some(5), 3), RESIZE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.action, ActionKind::Shrink);
    assert_eq!(failure.phase, Phase::Polling);
    match failure.cause() {
        CloudError::RemoteFatalState { label, detail, .. } => {
            assert_eq!(label, "abnormal");
            let detail = detail.as_ref().unwrap();
            assert_eq!(detail.message, "Decommissioning DataNode failed");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_apply_planned_node_updates() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(Method::Put, PROJECT_CLUSTER_INFO, [empty()])
            .on(Method::Get, PROJECT_CLUSTER_INFO, [cluster("running")]),
    );
    let old: NodeLayout = serde_json::from_value(json!({
        "analysis_core_nodes": 3,
        "analysis_task_nodes": {"node_number": 2, "flavor": "c6.2xlarge.4.linux.bigdata",
                                "data_volume_type": "SAS", "data_volume_size": 600, "data_volume_count": 1}
    }))
    .unwrap();
    let new: NodeLayout = serde_json::from_value(json!({
        "analysis_core_nodes": 4,
        "analysis_task_nodes": {"node_number": 1, "flavor": "c6.2xlarge.4.linux.bigdata",
                                "data_volume_type": "SAS", "data_volume_size": 600, "data_volume_count": 1}
    }))
    .unwrap();

    let updates = plan_node_updates(ClusterType::Analysis, &old, &new).unwrap();
    let outcomes = resize_cluster_nodes(
        &Orchestrator::with_locks(&LockTable::new()),
        &client,
        "cluster-1",
        updates,
        RESIZE_TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 2);
    let puts: Vec<_> = client
        .transport()
        .calls()
        .into_iter()
        .filter(|c| c.method == Method::Put)
        .collect();
    assert_eq!(puts.len(), 2);
    assert_eq!(
        puts[0].body.as_ref().unwrap()["parameters"]["node_group"],
        "core_node_analysis_group"
    );
    assert_eq!(puts[1].body.as_ref().unwrap()["parameters"]["scale_type"], "scale_in");
}

#[tokio::test(start_paused = true)]
async fn test_create_pay_per_use_cluster() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(
                Method::Post,
                "v2/{project_id}/clusters",
                [Reply::Json(json!({"cluster_id": "cluster-1"}))],
            )
            .on(
                Method::Get,
                PROJECT_CLUSTER_INFO,
                [cluster("starting"), cluster("running")],
            ),
    );

    let start = Instant::now();
    let outcome = Orchestrator::with_locks(&LockTable::new())
        .execute(&CreateCluster::new(&client), &cluster_spec("postPaid"), CREATE_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(outcome.handle().unwrap().as_str(), "cluster-1");
    assert_eq!(start.elapsed(), Duration::from_secs(480 + 15));
}

#[tokio::test(start_paused = true)]
async fn test_create_prepaid_cluster_resolves_id_from_order() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(
                Method::Post,
                "v2/{project_id}/clusters",
                [Reply::Json(json!({"order_id": "order-1"}))],
            )
            .on(Method::Get, PROJECT_CLUSTER_INFO, [cluster("running")]),
    );
    let billing = Arc::new(CbcClient::new(
        StubTransport::new()
            .on(Method::Post, "v2/orders/customer-orders/pay", [empty()])
            .on(
                Method::Get,
                "v2/orders/customer-orders/details/order-1",
                [Reply::Json(json!({"order_info": {"status": 5}}))],
            )
            .on(
                Method::Get,
                "v2/orders/suscriptions/resources?order_id=order-1&only_main_resource=1",
                [Reply::Json(json!({"data": [{"resource_id": "cluster-1"}]}))],
            ),
    ));

    let outcome = Orchestrator::with_locks(&LockTable::new())
        .with_billing(billing.clone())
        .execute(&CreateCluster::new(&client), &cluster_spec("prePaid"), CREATE_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(outcome.handle().unwrap().as_str(), "cluster-1");
    assert_eq!(
        billing
            .transport()
            .count(Method::Post, "v2/orders/customer-orders/pay"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_auto_paid_cluster_skips_payment() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(
                Method::Post,
                "v2/{project_id}/clusters",
                [Reply::Json(json!({"order_id": "order-1"}))],
            )
            .on(Method::Get, PROJECT_CLUSTER_INFO, [cluster("running")]),
    );
    let billing = Arc::new(CbcClient::new(
        StubTransport::new()
            .on(
                Method::Get,
                "v2/orders/customer-orders/details/order-1",
                [Reply::Json(json!({"order_info": {"status": 5}}))],
            )
            .on(
                Method::Get,
                "v2/orders/suscriptions/resources?order_id=order-1&only_main_resource=1",
                [Reply::Json(json!({"data": [{"resource_id": "cluster-1"}]}))],
            ),
    ));
    let mut spec = cluster_spec("prePaid");
    spec.charge_info.as_mut().unwrap().is_auto_pay = Some(true);

    let outcome = Orchestrator::with_locks(&LockTable::new())
        .with_billing(billing.clone())
        .execute(&CreateCluster::new(&client), &spec, CREATE_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(outcome.handle().unwrap().as_str(), "cluster-1");
    let billing_calls: Vec<_> = billing
        .transport()
        .calls()
        .into_iter()
        .map(|c| (c.method, c.path))
        .collect();
    assert_eq!(
        billing_calls,
        vec![
            (Method::Get, "v2/orders/customer-orders/details/order-1".to_string()),
            (
                Method::Get,
                "v2/orders/suscriptions/resources?order_id=order-1&only_main_resource=1"
                    .to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_create_rejects_invalid_spec() {
    let client = MrsClient::new(StubTransport::new());
    let mut spec = cluster_spec("postPaid");
    spec.node_groups.clear();

    let failure = Orchestrator::with_locks(&LockTable::new())
        .execute(&CreateCluster::new(&client), &spec, CREATE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.phase, Phase::Planning);
    assert!(failure.handle.is_none());
    assert!(client.transport().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_completes_when_cluster_disappears() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(Method::Delete, "v1.1/{project_id}/clusters/cluster-1", [empty()])
            .on(
                Method::Get,
                PROJECT_CLUSTER_INFO,
                [cluster("terminating"), Reply::Api(404, "MRS.0011")],
            ),
    );

    let start = Instant::now();
    let outcome = Orchestrator::with_locks(&LockTable::new())
        .execute(&DeleteCluster::new(&client), &ClusterRef::new("cluster-1"), DELETE_TIMEOUT)
        .await
        .unwrap();

    let status = outcome.status().unwrap();
    assert_eq!(status.kind, StatusKind::Gone);
    assert_eq!(start.elapsed(), Duration::from_secs(45 + 10));
}

#[tokio::test(start_paused = true)]
async fn test_delete_reports_failed_cluster() {
    let client = MrsClient::new(
        StubTransport::new()
            .on(Method::Delete, "v1.1/{project_id}/clusters/cluster-1", [empty()])
            .on(Method::Get, PROJECT_CLUSTER_INFO, [cluster("failed")]),
    );

    let failure = Orchestrator::with_locks(&LockTable::new())
        .execute(&DeleteCluster::new(&client), &ClusterRef::new("cluster-1"), DELETE_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.action, ActionKind::Delete);
    assert_eq!(failure.handle.as_ref().unwrap().as_str(), "cluster-1");
    assert!(matches!(failure.cause(), CloudError::RemoteFatalState { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_prepaid_cluster() {
    let client = MrsClient::new(StubTransport::new().on(
        Method::Get,
        PROJECT_CLUSTER_INFO,
        [cluster("running"), cluster("terminated")],
    ));
    let billing = Arc::new(CbcClient::new(StubTransport::new().on(
        Method::Post,
        "v2/orders/subscriptions/resources/unsubscribe",
        [Reply::Json(json!({"order_ids": ["order-9"]}))],
    )));

    let start = Instant::now();
    let outcome = Orchestrator::with_locks(&LockTable::new())
        .execute(
            &UnsubscribeCluster::new(&client, billing.clone()),
            &ClusterRef::new("cluster-1"),
            DELETE_TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status().unwrap().label.as_deref(), Some("terminated"));
    assert_eq!(start.elapsed(), Duration::from_secs(15 + 10));
    assert_eq!(
        billing.transport().calls()[0].body,
        Some(json!({"resource_ids": ["cluster-1"], "unsubscribe_type": 1}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_add_components_waits_for_installation() {
    let installed = Reply::Json(json!({
        "cluster": {
            "clusterId": "cluster-1",
            "clusterState": "running",
            "componentList": [
                {"componentName": "Hadoop"},
                {"componentName": "Hive"}
            ]
        }
    }));
    let client = MrsClient::new(
        StubTransport::new()
            .on(
                Method::Post,
                "v2/{project_id}/clusters/cluster-1/components",
                [empty()],
            )
            .on(
                Method::Get,
                PROJECT_CLUSTER_INFO,
                [cluster("running"), cluster("running"), installed],
            ),
    );
    let components = vec!["Hive".to_string()];

    let outcome = Orchestrator::with_locks(&LockTable::new())
        .execute(
            &AddComponents::new(&client, &components),
            &ClusterRef::new("cluster-1"),
            CREATE_TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status().unwrap().label.as_deref(), Some("installed"));
    let calls = client.transport().calls();
    assert_eq!(calls[0].method, Method::Get);
    assert_eq!(
        calls[1].body,
        Some(json!({"components_install_mode": [{"component": "Hive"}]}))
    );
    assert_eq!(client.transport().count(Method::Get, PROJECT_CLUSTER_INFO), 3);
}
