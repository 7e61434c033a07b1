//! Convergence polling
//!
//! After an asynchronous create or delete, the provider observes the remote
//! object at a fixed interval until it reaches a terminal state, reaches a
//! declared failure state, is cancelled, or the attempt budget runs out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// What a single probe saw
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    Present(T),
    Absent,
}

impl<T> Observation<T> {
    /// Map a lookup result so that "not found" becomes [`Observation::Absent`]
    pub fn from_lookup(result: Result<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Observation::Present(value)),
            Err(e) if e.is_not_found() => Ok(Observation::Absent),
            Err(e) => Err(e),
        }
    }

    pub fn present(self) -> Option<T> {
        match self {
            Observation::Present(v) => Some(v),
            Observation::Absent => None,
        }
    }
}

/// Anything carrying a lifecycle status string
pub trait StatusReport {
    fn status(&self) -> Option<&str>;
}

impl StatusReport for serde_json::Value {
    fn status(&self) -> Option<&str> {
        self.get("status").and_then(|s| s.as_str())
    }
}

/// Condition a wait is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The object reports one of `ready`; any of `failed` aborts the wait
    Status {
        ready: Vec<String>,
        failed: Vec<String>,
    },
    /// The object no longer exists
    Absent,
}

impl Target {
    pub fn status(ready: &[&str]) -> Self {
        Target::Status {
            ready: ready.iter().map(|s| s.to_string()).collect(),
            failed: Vec::new(),
        }
    }

    pub fn status_or_fail(ready: &[&str], failed: &[&str]) -> Self {
        Target::Status {
            ready: ready.iter().map(|s| s.to_string()).collect(),
            failed: failed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Status { ready, .. } => write!(f, "status {}", ready.join("|")),
            Target::Absent => write!(f, "deletion"),
        }
    }
}

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq)]
pub struct Converged<T> {
    pub observation: Observation<T>,
    pub attempts: u32,
}

/// Waits between probes; replaced in tests to avoid real delays
#[async_trait]
pub trait Sleeper: Send + Sync + fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-interval poller with an attempt budget
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            sleeper: Arc::new(TokioSleeper),
            cancel: CancellationToken::new(),
        }
    }

    /// 5 seconds between probes, 24 probes
    pub fn provisioning() -> Self {
        Self::new(Duration::from_secs(5), 24)
    }

    /// 10 seconds between probes, 24 probes
    pub fn teardown() -> Self {
        Self::new(Duration::from_secs(10), 24)
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Probe until `target` holds.
    ///
    /// Transient probe errors count as attempts and polling continues; any
    /// other error is returned at once.
    pub async fn wait_for<T, F, Fut>(&self, target: &Target, mut probe: F) -> Result<Converged<T>>
    where
        T: StatusReport + Send,
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<Observation<T>>> + Send,
    {
        let mut attempts = 0u32;
        let mut last_state = String::from("unobserved");

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    target: target.to_string(),
                });
            }

            let outcome = probe().await;
            attempts += 1;

            match outcome {
                Ok(observation) => {
                    last_state = describe(&observation);
                    match evaluate(target, &observation) {
                        Verdict::Done => {
                            debug!(target = %target, attempts, "Converged");
                            return Ok(Converged {
                                observation,
                                attempts,
                            });
                        }
                        Verdict::Failed(state) => {
                            return Err(Error::Failed {
                                target: target.to_string(),
                                state,
                            });
                        }
                        Verdict::Pending => {
                            debug!(target = %target, attempts, state = %last_state, "Still waiting");
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(target = %target, attempts, "Transient error while polling: {}", e);
                    last_state = format!("unobserved: {}", e);
                }
                Err(e) => return Err(e),
            }

            if attempts >= self.max_attempts {
                return Err(Error::Timeout {
                    target: target.to_string(),
                    last_state,
                    attempts,
                });
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(Error::Cancelled { target: target.to_string() });
                }
                _ = self.sleeper.sleep(self.interval) => {}
            }
        }
    }
}

enum Verdict {
    Done,
    Failed(String),
    Pending,
}

fn evaluate<T: StatusReport>(target: &Target, observation: &Observation<T>) -> Verdict {
    match (target, observation) {
        (Target::Absent, Observation::Absent) => Verdict::Done,
        (Target::Absent, Observation::Present(_)) => Verdict::Pending,
        (Target::Status { .. }, Observation::Absent) => Verdict::Pending,
        (Target::Status { ready, failed }, Observation::Present(value)) => match value.status() {
            Some(s) if ready.iter().any(|r| r == s) => Verdict::Done,
            Some(s) if failed.iter().any(|f| f == s) => Verdict::Failed(s.to_string()),
            _ => Verdict::Pending,
        },
    }
}

fn describe<T: StatusReport>(observation: &Observation<T>) -> String {
    match observation {
        Observation::Absent => "absent".to_string(),
        Observation::Present(v) => v.status().unwrap_or("unknown").to_string(),
    }
}
