//! MapReduce Service (MRS) cluster operations
//!
//! Cluster lifecycle actions expressed as [`hwcloud_core::ActionStrategy`]
//! implementations, so that each one runs through the shared
//! [`hwcloud_core::Orchestrator`]:
//!
//! - create (pay-per-use or prepaid through a CBC order)
//! - expand / shrink of a node group
//! - add components
//! - delete (pay-per-use) and unsubscribe (prepaid)
//!
//! # Example
//!
//! ```ignore
//! use hwcloud_core::Orchestrator;
//! use hwcloud_mrs::{GroupResize, GroupUpdate, MrsClient, ResizeGroup, RESIZE_TIMEOUT};
//!
//! let client = MrsClient::new(transport);
//! let request = GroupResize::new("cluster-id", GroupUpdate::new("core_node_analysis_group", Some(3), 5));
//! let outcome = Orchestrator::new()
//!     .execute(&ResizeGroup::new(&client), &request, RESIZE_TIMEOUT)
//!     .await?;
//! ```

pub mod actions;
pub mod client;
pub mod cluster;
pub mod nodes;
pub mod probe;

pub use actions::{
    AddComponents, ClusterRef, CreateCluster, DeleteCluster, GroupResize,
    RESIZE_TIMEOUT, ResizeGroup, UnsubscribeCluster, resize_cluster_nodes,
};
pub use client::{CreatedCluster, MrsClient};
pub use cluster::{ClusterInfo, ClusterSpec, ComponentInfo, NodeGroupSpec, cluster_state};
pub use nodes::{ClusterType, GroupUpdate, NodeLayout, TaskNodes, plan_node_updates};
pub use probe::{ClusterStatusProbe, ComponentProbe};
