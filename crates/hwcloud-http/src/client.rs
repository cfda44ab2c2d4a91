//! reqwest-backed transport

use crate::endpoint::service_endpoint;
use async_trait::async_trait;
use hwcloud_config::ProviderConfig;
use hwcloud_core::{CloudError, Method, Result, Transport};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROJECT_ID_PLACEHOLDER: &str = "{project_id}";

/// Transport bound to one service endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    auth_token: String,
}

impl HttpTransport {
    /// Create a transport for `service` (e.g. "mrs", "bss")
    pub fn for_service(config: &ProviderConfig, service: &str) -> Result<Self> {
        Self::new(
            service_endpoint(config, service),
            &config.project_id,
            &config.auth_token,
        )
    }

    pub fn new(endpoint: impl Into<String>, project_id: &str, auth_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CloudError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            project_id: project_id.to_string(),
            auth_token: auth_token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for a service-relative path
    pub fn url(&self, path: &str) -> String {
        let path = path
            .trim_start_matches('/')
            .replace(PROJECT_ID_PLACEHOLDER, &self.project_id);
        format!("{}{}", self.endpoint, path)
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self
            .client
            .request(to_reqwest(method), &url)
            .header("X-Auth-Token", &self.auth_token)
            .header("X-Project-Id", &self.project_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CloudError::Transport(format!("{} {}: {}", method, url, e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CloudError::Transport(format!("{} {}: {}", method, url, e)))?;

        if !status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "Request failed");
            return Err(decode_error(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Error bodies returned by HuaweiCloud services
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Flat {
        #[serde(alias = "errorCode")]
        error_code: String,
        #[serde(alias = "errorMsg")]
        error_msg: String,
    },
    Nested {
        error: NestedError,
    },
}

#[derive(Debug, Deserialize)]
struct NestedError {
    code: String,
    message: String,
}

/// Turn a non-success response into [`CloudError::Api`]
pub fn decode_error(status: u16, body: &str) -> CloudError {
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody::Flat {
            error_code,
            error_msg,
        }) => (error_code, error_msg),
        Ok(ApiErrorBody::Nested { error }) => (error.code, error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    CloudError::Api {
        status,
        code,
        message,
    }
}
