//! Polling loop turning repeated probes into one terminal result

use crate::error::{CloudError, Result};
use crate::probe::StatusProbe;
use crate::status::{Status, StatusKind};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// What counts as successful completion of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A target label must be observed
    Target,
    /// A target label or the disappearance of the resource
    Deletion,
}

/// Label sets and timing for one poll
#[derive(Debug, Clone)]
pub struct PollSpec {
    pending: BTreeSet<String>,
    target: BTreeSet<String>,
    fatal: BTreeSet<String>,
    delay: Duration,
    interval: Duration,
    timeout: Duration,
    completion: Completion,
}

impl PollSpec {
    /// Start a spec from its pending and target label sets
    pub fn new<P, T>(pending: P, target: T) -> PollSpecBuilder
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        PollSpecBuilder {
            spec: PollSpec {
                pending: pending.into_iter().map(Into::into).collect(),
                target: target.into_iter().map(Into::into).collect(),
                fatal: BTreeSet::new(),
                delay: Duration::ZERO,
                interval: DEFAULT_INTERVAL,
                timeout: DEFAULT_TIMEOUT,
                completion: Completion::Target,
            },
        }
    }

    pub fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn target(&self) -> &BTreeSet<String> {
        &self.target
    }

    pub fn fatal(&self) -> &BTreeSet<String> {
        &self.fatal
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Replace the overall timeout budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept the disappearance of the resource as success
    pub fn into_deletion(mut self) -> Self {
        self.completion = Completion::Deletion;
        self
    }
}

/// Builder validating the [`PollSpec`] invariants
#[derive(Debug, Clone)]
pub struct PollSpecBuilder {
    spec: PollSpec,
}

impl PollSpecBuilder {
    pub fn with_fatal<I>(mut self, fatal: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.spec.fatal = fatal.into_iter().map(Into::into).collect();
        self
    }

    /// Grace period before the first probe
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.spec.delay = delay;
        self
    }

    /// Spacing between probes
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.spec.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    pub fn expect_deletion(mut self) -> Self {
        self.spec.completion = Completion::Deletion;
        self
    }

    pub fn build(self) -> Result<PollSpec> {
        let spec = self.spec;

        if let Some(label) = spec.pending.intersection(&spec.target).next() {
            return Err(CloudError::invariant(format!(
                "label '{}' is both pending and target",
                label
            )));
        }
        if let Some(label) = spec
            .fatal
            .iter()
            .find(|l| spec.pending.contains(*l) || spec.target.contains(*l))
        {
            return Err(CloudError::invariant(format!(
                "fatal label '{}' overlaps the pending or target labels",
                label
            )));
        }
        if spec.target.is_empty() && spec.completion == Completion::Target {
            return Err(CloudError::invariant(
                "a poll that does not expect deletion needs at least one target label",
            ));
        }
        if spec.interval.is_zero() {
            return Err(CloudError::invariant("poll interval must be positive"));
        }

        Ok(spec)
    }
}

/// Drive `probe` until it reports a terminal status or `spec.timeout()` elapses.
///
/// The timeout budget covers the initial delay and every probe call: a
/// probe still running at the deadline is abandoned. Retryable probe errors
/// (network failures, 5xx, throttling) are logged and retried like a pending
/// status; any other error aborts the poll.
pub async fn poll_to_completion<P>(probe: &P, spec: &PollSpec) -> Result<Status>
where
    P: StatusProbe + ?Sized,
{
    let resource_id = probe.resource_id();
    let started = Instant::now();
    let deadline = started + spec.timeout();

    if !spec.delay().is_zero() {
        tracing::debug!(
            resource_id,
            delay = ?spec.delay(),
            "Waiting before the first status probe"
        );
        sleep(spec.delay().min(spec.timeout())).await;
    }

    let mut last: Option<Status> = None;
    let mut tick: u32 = 0;
    let mut transient_errors: u32 = 0;

    loop {
        if Instant::now() >= deadline {
            return Err(timed_out(resource_id, started, tick, transient_errors, last));
        }

        tick += 1;
        let probed = match timeout_at(deadline, probe.probe(spec)).await {
            Ok(probed) => probed,
            Err(_) => {
                tracing::debug!(resource_id, tick, "Status probe still running at the deadline");
                return Err(timed_out(resource_id, started, tick, transient_errors, last));
            }
        };
        match probed {
            Ok(status) => {
                tracing::debug!(
                    resource_id,
                    tick,
                    label = status.label_str(),
                    kind = %status.kind,
                    "Probed remote status"
                );
                match status.kind {
                    StatusKind::Target | StatusKind::Gone => {
                        tracing::info!(
                            resource_id,
                            ticks = tick,
                            "Remote operation completed ({})",
                            status.label_str()
                        );
                        return Ok(status);
                    }
                    StatusKind::Error => {
                        return Err(CloudError::RemoteFatalState {
                            resource_id: resource_id.to_string(),
                            label: status.label_str().to_string(),
                            detail: status.detail,
                        });
                    }
                    StatusKind::Pending => last = Some(status),
                }
            }
            Err(err) if err.is_retryable() => {
                transient_errors += 1;
                tracing::warn!(resource_id, tick, "Status probe failed, retrying: {}", err);
            }
            Err(err) => return Err(err),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        sleep(spec.interval().min(remaining)).await;
    }
}

fn timed_out(
    resource_id: &str,
    started: Instant,
    ticks: u32,
    transient_errors: u32,
    last: Option<Status>,
) -> CloudError {
    let elapsed = started.elapsed();
    tracing::warn!(
        resource_id,
        ticks,
        transient_errors,
        "Polling timed out after {:?}",
        elapsed
    );
    let (last_label, last_raw) = match last {
        Some(status) => (status.label, status.raw),
        None => (None, None),
    };
    CloudError::Timeout {
        resource_id: resource_id.to_string(),
        elapsed,
        last_label,
        last_raw,
    }
}
