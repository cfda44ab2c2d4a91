//! CBC (Cloud Business Center) billing for prepaid resources
//!
//! Prepaid operations answer with an order. [`CbcClient`] pays the order,
//! waits for the order to complete and resolves the resource it produced,
//! and unsubscribes prepaid resources on deletion.

pub mod client;
pub mod order;

pub use client::CbcClient;
pub use order::{OrderResourceProbe, OrderStatusProbe, order_resource_spec, order_status_spec};
