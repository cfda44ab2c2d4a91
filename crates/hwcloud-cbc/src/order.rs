//! Order probes

use async_trait::async_trait;
use hwcloud_core::{PollSpec, RemoteState, Result, StatusProbe, Transport};
use serde_json::Value;
use std::time::Duration;

const ORDER_POLL_DELAY: Duration = Duration::from_secs(5);
const ORDER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Order status codes reported by CBC
mod order_status {
    pub const PENDING_APPROVAL: &str = "1";
    pub const PROCESSING: &str = "3";
    pub const CANCELLED: &str = "4";
    pub const COMPLETED: &str = "5";
    pub const PENDING_PAYMENT: &str = "6";
}

const RESOURCE_PENDING: &str = "pending";
const RESOURCE_READY: &str = "ready";

/// Label sets for waiting until an order is completed
pub fn order_status_spec(timeout: Duration) -> Result<PollSpec> {
    PollSpec::new(
        [
            order_status::PENDING_APPROVAL,
            order_status::PROCESSING,
            order_status::PENDING_PAYMENT,
        ],
        [order_status::COMPLETED],
    )
    .with_fatal([order_status::CANCELLED])
    .with_delay(ORDER_POLL_DELAY)
    .with_interval(ORDER_POLL_INTERVAL)
    .with_timeout(timeout)
    .build()
}

/// Label sets for waiting until an order has produced its main resource
pub fn order_resource_spec(timeout: Duration) -> Result<PollSpec> {
    PollSpec::new([RESOURCE_PENDING], [RESOURCE_READY])
        .with_delay(ORDER_POLL_DELAY)
        .with_interval(ORDER_POLL_INTERVAL)
        .with_timeout(timeout)
        .build()
}

pub(crate) fn order_details_path(order_id: &str) -> String {
    format!("v2/orders/customer-orders/details/{}", order_id)
}

pub(crate) fn order_resources_path(order_id: &str) -> String {
    format!(
        "v2/orders/suscriptions/resources?order_id={}&only_main_resource=1",
        order_id
    )
}

/// Order status as a label; CBC reports it as a number
fn status_label(details: &Value) -> Option<String> {
    match &details["order_info"]["status"] {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// ID of the first main resource listed for an order
pub fn main_resource_id(resources: &Value) -> Option<String> {
    resources["data"]
        .as_array()?
        .iter()
        .find_map(|item| item["resource_id"].as_str().filter(|id| !id.is_empty()))
        .map(String::from)
}

/// Tracks the status of one order
pub struct OrderStatusProbe<'a, T: ?Sized> {
    transport: &'a T,
    order_id: String,
}

impl<'a, T: Transport + ?Sized> OrderStatusProbe<'a, T> {
    pub fn new(transport: &'a T, order_id: impl Into<String>) -> Self {
        Self {
            transport,
            order_id: order_id.into(),
        }
    }
}

#[async_trait]
impl<T: Transport + ?Sized> StatusProbe for OrderStatusProbe<'_, T> {
    fn resource_id(&self) -> &str {
        &self.order_id
    }

    async fn fetch(&self) -> Result<RemoteState> {
        let details = match self.transport.get(&order_details_path(&self.order_id)).await {
            Ok(details) => details,
            Err(err) if err.is_not_found() => return Ok(RemoteState::NotFound),
            Err(err) => return Err(err),
        };

        let label = status_label(&details).unwrap_or_default();
        tracing::debug!(order_id = %self.order_id, status = %label, "Order status");
        Ok(RemoteState::found(label, details))
    }
}

/// Tracks whether an order has produced its main resource
pub struct OrderResourceProbe<'a, T: ?Sized> {
    transport: &'a T,
    order_id: String,
}

impl<'a, T: Transport + ?Sized> OrderResourceProbe<'a, T> {
    pub fn new(transport: &'a T, order_id: impl Into<String>) -> Self {
        Self {
            transport,
            order_id: order_id.into(),
        }
    }
}

#[async_trait]
impl<T: Transport + ?Sized> StatusProbe for OrderResourceProbe<'_, T> {
    fn resource_id(&self) -> &str {
        &self.order_id
    }

    async fn fetch(&self) -> Result<RemoteState> {
        let resources = self
            .transport
            .get(&order_resources_path(&self.order_id))
            .await?;
        let label = match main_resource_id(&resources) {
            Some(_) => RESOURCE_READY,
            None => RESOURCE_PENDING,
        };
        Ok(RemoteState::found(label, resources))
    }
}
