//! HTTP transport for HuaweiCloud service endpoints
//!
//! Implements the [`hwcloud_core::Transport`] contract on top of `reqwest`,
//! using IAM token authentication (`X-Auth-Token`).
//!
//! # Example
//!
//! ```ignore
//! use hwcloud_config::ProviderConfig;
//! use hwcloud_http::HttpTransport;
//! use hwcloud_core::Transport;
//!
//! let config = ProviderConfig::load()?;
//! let mrs = HttpTransport::for_service(&config, "mrs")?;
//! let cluster = mrs.get("v1.1/{project_id}/cluster_infos/abc").await?;
//! ```

pub mod client;
pub mod endpoint;

pub use client::{HttpTransport, decode_error};
pub use endpoint::service_endpoint;
