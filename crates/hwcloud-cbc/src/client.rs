use crate::order::{
    OrderResourceProbe, OrderStatusProbe, main_resource_id, order_resource_spec,
    order_status_spec,
};
use async_trait::async_trait;
use hwcloud_core::{Billing, CloudError, Method, Result, Transport, poll_to_completion};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PAY_ORDER_PATH: &str = "v2/orders/customer-orders/pay";
const UNSUBSCRIBE_PATH: &str = "v2/orders/subscriptions/resources/unsubscribe";

/// Unsubscribe the resources together with their attached resources
const UNSUBSCRIBE_TYPE_WITH_ATTACHMENTS: u8 = 1;

#[derive(Debug, Deserialize)]
struct UnsubscribeResponse {
    #[serde(default)]
    order_ids: Vec<String>,
}

/// CBC client on top of a BSS transport
pub struct CbcClient<T> {
    transport: T,
}

impl<T: Transport> CbcClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> Billing for CbcClient<T> {
    async fn pay_order(&self, order_id: &str) -> Result<()> {
        tracing::info!(%order_id, "Paying order");
        let body = json!({
            "order_id": order_id,
            "use_coupon": "NO",
            "use_discount": "NO",
        });
        self.transport
            .submit(Method::Post, PAY_ORDER_PATH, &body)
            .await?;
        Ok(())
    }

    async fn wait_order_complete(&self, order_id: &str, timeout: Duration) -> Result<()> {
        let spec = order_status_spec(timeout)?;
        let probe = OrderStatusProbe::new(&self.transport, order_id);
        let status = poll_to_completion(&probe, &spec).await?;
        tracing::info!(%order_id, status = status.label_str(), "Order completed");
        Ok(())
    }

    async fn wait_order_resource(&self, order_id: &str, timeout: Duration) -> Result<String> {
        let spec = order_resource_spec(timeout)?;
        let probe = OrderResourceProbe::new(&self.transport, order_id);
        let status = poll_to_completion(&probe, &spec).await?;

        let resource_id = status
            .raw
            .as_ref()
            .and_then(main_resource_id)
            .ok_or_else(|| {
                CloudError::invariant(format!("order {} reported no main resource", order_id))
            })?;
        tracing::info!(%order_id, %resource_id, "Order resource ready");
        Ok(resource_id)
    }

    async fn unsubscribe(&self, resource_ids: &[String]) -> Result<Vec<String>> {
        if resource_ids.is_empty() {
            return Err(CloudError::invariant("no resources to unsubscribe"));
        }

        tracing::info!(resources = ?resource_ids, "Unsubscribing prepaid resources");
        let body = json!({
            "resource_ids": resource_ids,
            "unsubscribe_type": UNSUBSCRIBE_TYPE_WITH_ATTACHMENTS,
        });
        let response = self
            .transport
            .submit(Method::Post, UNSUBSCRIBE_PATH, &body)
            .await?;
        if response.is_null() {
            return Ok(Vec::new());
        }
        let response: UnsubscribeResponse = serde_json::from_value(response)?;
        Ok(response.order_ids)
    }
}
