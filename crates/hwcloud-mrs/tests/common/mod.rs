#![allow(dead_code)]

use async_trait::async_trait;
use hwcloud_core::{CloudError, Method, Result, Transport};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Canned reply of the stub transport
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Api(u16, &'static str),
    Unreachable,
}

impl Reply {
    fn to_result(&self) -> Result<Value> {
        match self {
            Reply::Json(value) => Ok(value.clone()),
            Reply::Api(status, code) => Err(CloudError::Api {
                status: *status,
                code: code.to_string(),
                message: format!("stub error {}", code),
            }),
            Reply::Unreachable => Err(CloudError::Transport("connection refused".to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from per-route reply queues.
///
/// The last reply of a route repeats once the queue is drained.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            replies: replies.into_iter().collect(),
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
            .unwrap_or_else(|| panic!("unexpected request: {} {}", method, path));
        let reply = if route.replies.len() > 1 {
            route.replies.pop_front().unwrap()
        } else {
            route.replies.front().cloned().expect("route without replies")
        };
        reply.to_result()
    }
}

pub const PROJECT_CLUSTER_INFO: &str = "v1.1/{project_id}/cluster_infos/cluster-1";

/// `GET cluster_infos` answer with the given state
pub fn cluster(state: &str) -> Reply {
    Reply::Json(serde_json::json!({
        "cluster": {
            "clusterId": "cluster-1",
            "clusterName": "mrs-demo",
            "clusterState": state,
            "componentList": [{"componentId": "1", "componentName": "Hadoop"}]
        }
    }))
}

pub fn empty() -> Reply {
    Reply::Json(Value::Null)
}
