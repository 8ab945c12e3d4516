//! Health Module
//!
//! Composite liveness over every configured backend. The whole service is
//! healthy only when every backend answers its probe.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backend::SharedBackend;
use crate::cache::CacheService;

/// Default upper bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// == Health Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

// == Backend Health ==
/// Outcome of one probe. Recomputed on every check, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendHealth {
    pub name: String,
    pub reachable: bool,
}

// == Health Report ==
/// Composite result of one health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: BTreeMap<String, bool>,
}

impl HealthReport {
    /// Folds probe results: any unreachable backend makes the report unhealthy.
    ///
    /// Backends sharing a name share one component entry, which is
    /// reachable only if all of them are.
    pub fn from_probes(probes: impl IntoIterator<Item = BackendHealth>) -> Self {
        let mut status = HealthStatus::Healthy;
        let mut components = BTreeMap::new();
        for probe in probes {
            if !probe.reachable {
                status = HealthStatus::Unhealthy;
            }
            components
                .entry(probe.name)
                .and_modify(|reachable: &mut bool| *reachable &= probe.reachable)
                .or_insert(probe.reachable);
        }

        Self { status, components }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

// == Health Aggregator ==
/// Probes every backend concurrently, each under its own timeout.
#[derive(Clone)]
pub struct HealthAggregator {
    backends: Vec<SharedBackend>,
    probe_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(backends: Vec<SharedBackend>, probe_timeout: Duration) -> Self {
        Self {
            backends,
            probe_timeout,
        }
    }

    /// Probes every backend the service uses.
    pub fn from_service(service: &CacheService, probe_timeout: Duration) -> Self {
        Self::new(service.backends(), probe_timeout)
    }

    /// Runs all probes and waits for each to finish or hit its timeout.
    pub async fn check(&self) -> HealthReport {
        self.collect(None).await
    }

    /// Like [`HealthAggregator::check`], but gives up waiting after `deadline`.
    ///
    /// Probes still running at the deadline are reported unreachable. The
    /// probe tasks themselves are left to finish on their own.
    pub async fn check_within(&self, deadline: Duration) -> HealthReport {
        self.collect(Some(Instant::now() + deadline)).await
    }

    async fn collect(&self, deadline: Option<Instant>) -> HealthReport {
        let probes: Vec<(String, JoinHandle<bool>)> = self
            .backends
            .iter()
            .map(|backend| (backend.name().to_string(), self.spawn_probe(backend.clone())))
            .collect();

        let mut results = Vec::with_capacity(probes.len());
        for (name, handle) in probes {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(backend = %name, "health probe still running at deadline");
                        Ok(false)
                    }
                },
                None => handle.await,
            };

            let reachable = joined.unwrap_or_else(|e| {
                warn!(backend = %name, error = %e, "health probe task failed");
                false
            });
            results.push(BackendHealth { name, reachable });
        }

        let report = HealthReport::from_probes(results);
        debug!(status = report.status.as_str(), "health check complete");
        report
    }

    fn spawn_probe(&self, backend: SharedBackend) -> JoinHandle<bool> {
        let timeout = self.probe_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, backend.ping()).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(backend = backend.name(), error = %e, "backend unreachable");
                    false
                }
                Err(_) => {
                    warn!(backend = backend.name(), ?timeout, "health probe timed out");
                    false
                }
            }
        })
    }
}
