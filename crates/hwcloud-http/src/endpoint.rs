//! Service endpoint resolution

use hwcloud_config::ProviderConfig;

/// Services served from a single global endpoint instead of per region
const GLOBAL_SERVICES: [&str; 2] = ["bss", "bss-intl"];

const DOMAIN: &str = "myhuaweicloud.com";

/// Base URL (with trailing slash) of `service` for the configured region
pub fn service_endpoint(config: &ProviderConfig, service: &str) -> String {
    if let Some(endpoint) = config.endpoint_override(service) {
        return with_trailing_slash(endpoint);
    }

    if GLOBAL_SERVICES.contains(&service) {
        format!("https://{}.{}/", service, DOMAIN)
    } else {
        format!("https://{}.{}.{}/", service, config.region, DOMAIN)
    }
}

fn with_trailing_slash(endpoint: &str) -> String {
    if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{}/", endpoint)
    }
}
