//! Collaborator contracts consumed by the reconciliation core

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// HTTP method of a remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response channel to one service endpoint
///
/// Paths are relative to the service endpoint and may contain the
/// `{project_id}` placeholder. Network failures surface as
/// [`CloudError::Transport`](crate::CloudError::Transport), non-success HTTP
/// answers as [`CloudError::Api`](crate::CloudError::Api), so callers can
/// tell retryable from fatal failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value>;

    /// Read-only call
    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        self.request(Method::Get, path, None).await
    }

    /// Mutating call
    async fn submit(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.request(method, path, Some(body)).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        (**self).request(method, path, body).await
    }
}

/// Billing (order) collaborator
///
/// Prepaid operations answer the submit call with an order that has to be
/// paid before the remote side starts working.
#[async_trait]
pub trait Billing: Send + Sync {
    /// Confirm payment of `order_id`
    async fn pay_order(&self, order_id: &str) -> Result<()>;

    /// Wait until the order reaches its completed state
    async fn wait_order_complete(&self, order_id: &str, timeout: Duration) -> Result<()>;

    /// Wait until the order has produced its main resource and return its ID
    async fn wait_order_resource(&self, order_id: &str, timeout: Duration) -> Result<String>;

    /// Unsubscribe prepaid resources, returning the unsubscription order IDs
    async fn unsubscribe(&self, resource_ids: &[String]) -> Result<Vec<String>>;
}
