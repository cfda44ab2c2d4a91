//! Single remote-status fetch

use crate::error::Result;
use crate::poller::PollSpec;
use crate::status::{RemoteState, Status, classify};
use async_trait::async_trait;
use std::future::Future;

/// Reads the current remote representation of one tracked resource.
///
/// Implementations must be read-only: the Poller calls `fetch` an unbounded
/// number of times. A "resource does not exist" answer is reported as
/// [`RemoteState::NotFound`], not as an error.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Identifier of the tracked resource, used in logs and timeout errors
    fn resource_id(&self) -> &str;

    /// Fetch the current remote state
    async fn fetch(&self) -> Result<RemoteState>;

    /// Fetch and classify against the label sets of `spec`
    async fn probe(&self, spec: &PollSpec) -> Result<Status> {
        let state = self.fetch().await?;
        Ok(classify(spec, state))
    }
}

/// Probe backed by an async closure
pub struct FnProbe<F> {
    resource_id: String,
    fetch: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RemoteState>> + Send + 'static,
{
    pub fn new(resource_id: impl Into<String>, fetch: F) -> Self {
        Self {
            resource_id: resource_id.into(),
            fetch,
        }
    }
}

#[async_trait]
impl<F, Fut> StatusProbe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RemoteState>> + Send + 'static,
{
    fn resource_id(&self) -> &str {
        &self.resource_id
    }

    async fn fetch(&self) -> Result<RemoteState> {
        (self.fetch)().await
    }
}
