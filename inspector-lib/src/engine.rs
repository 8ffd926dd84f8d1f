//! Bounded-concurrency probe engine.
//!
//! The engine owns its transport, its admission pool and its configuration.
//! Each target runs as its own task; a task only starts once it holds a permit
//! from the pool, and the permit is released when the task finishes, whatever
//! the outcome.

use crate::error::ProbeError;
use crate::transport::{HttpTransport, Transport};
use crate::types::{ProbeConfig, ProbeOutcome, ProbeReport, ProbeResult, ProbeTarget};
use futures::stream::{Stream, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Probes a list of targets with at most `concurrency` requests in flight.
///
/// # Example
///
/// ```rust,no_run
/// use inspector_lib::{Catalogue, ProbeConfig, ProbeEngine};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let targets = Catalogue::builtin().build_targets("alice", &["tech"])?;
///     let engine = ProbeEngine::new(ProbeConfig::default().with_concurrency(4))?;
///
///     for found in engine.probe(targets).await {
///         println!("{} : {}", found.name, found.url);
///     }
///     Ok(())
/// }
/// ```
pub struct ProbeEngine<T: Transport = HttpTransport> {
    /// Configuration settings for this engine instance
    config: ProbeConfig,
    /// Shared transport (one connection pool for every probe)
    transport: Arc<T>,
    /// Admission pool; one permit per request in flight
    limiter: Arc<Semaphore>,
}

impl ProbeEngine<HttpTransport> {
    /// Create an engine backed by a reqwest client built from `config`.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let transport = HttpTransport::with_config(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> ProbeEngine<T> {
    /// Create an engine around a custom transport.
    pub fn with_transport(transport: T, config: ProbeConfig) -> Self {
        let concurrency = config.concurrency;
        let config = config.with_concurrency(concurrency);

        Self {
            limiter: Arc::new(Semaphore::new(config.concurrency)),
            transport: Arc::new(transport),
            config,
        }
    }

    /// Get the configuration for this engine.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Admission slots not currently held by a request.
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Probe every target and return the ones that matched.
    ///
    /// Returns only after each target has matched, not matched or failed.
    /// Failed targets are logged and left out; the order of the returned
    /// matches is unspecified.
    pub async fn probe(&self, targets: Vec<ProbeTarget>) -> Vec<ProbeResult> {
        self.probe_reports(targets)
            .await
            .into_iter()
            .filter_map(ProbeReport::into_result)
            .collect()
    }

    /// Probe every target and return one report per target.
    pub async fn probe_reports(&self, targets: Vec<ProbeTarget>) -> Vec<ProbeReport> {
        if targets.is_empty() {
            return Vec::new();
        }

        let total = targets.len();
        let started = Instant::now();
        let reports: Vec<ProbeReport> = self.probe_stream(targets).collect().await;

        let matched = reports.iter().filter(|r| r.is_match()).count();
        let failed = reports
            .iter()
            .filter(|r| matches!(r.outcome, ProbeOutcome::Failed { .. }))
            .count();
        debug!(
            total,
            matched,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "probe run finished"
        );

        reports
    }

    /// Probe targets and yield reports as they complete.
    ///
    /// The stream ends once every target has reached a terminal state.
    /// Dropping the stream early stops admitting new targets; requests already
    /// in flight run to completion and release their slots.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn probe_stream(
        &self,
        targets: Vec<ProbeTarget>,
    ) -> Pin<Box<dyn Stream<Item = ProbeReport> + Send>> {
        let (tx, rx) = mpsc::unbounded_channel();

        if !targets.is_empty() {
            debug!(
                targets = targets.len(),
                concurrency = self.config.concurrency,
                "probe run started"
            );
            tokio::spawn(dispatch(
                self.transport.clone(),
                self.limiter.clone(),
                self.config.timeout,
                targets,
                tx,
            ));
        }

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|report| (report, rx))
        });

        Box::pin(stream)
    }
}

impl<T: Transport> Clone for ProbeEngine<T> {
    /// Clones share the transport and the admission pool.
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

/// Admit targets one permit at a time and wait for every task to finish.
async fn dispatch<T: Transport>(
    transport: Arc<T>,
    limiter: Arc<Semaphore>,
    timeout: Duration,
    targets: Vec<ProbeTarget>,
    tx: mpsc::UnboundedSender<ProbeReport>,
) {
    let mut tasks = JoinSet::new();

    for target in targets {
        let permit = match limiter.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("admission pool closed, remaining targets skipped");
                break;
            }
        };

        if tx.is_closed() {
            debug!("report receiver dropped, no further targets admitted");
            break;
        }

        let transport = transport.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            let name = target.name.clone();
            let url = target.url.clone();

            let report = AssertUnwindSafe(probe_target(transport.as_ref(), target, timeout))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!(platform = %name, url = %url, "probe task panicked");
                    ProbeReport {
                        name,
                        url,
                        outcome: ProbeOutcome::Failed {
                            error: ProbeError::internal("probe task panicked"),
                        },
                        elapsed: Duration::ZERO,
                    }
                });

            drop(permit);
            let _ = tx.send(report);
        });
    }

    // The sender held here keeps the stream open until every task is done.
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "probe task did not complete");
        }
    }
}

/// Run one request and classify it.
async fn probe_target<T: Transport>(
    transport: &T,
    target: ProbeTarget,
    timeout: Duration,
) -> ProbeReport {
    let started = Instant::now();

    let outcome = match tokio::time::timeout(timeout, transport.get(&target.url)).await {
        Ok(Ok(response)) => {
            if target.rule.matches(&response) {
                debug!(platform = %target.name, status = response.status, "user found");
                ProbeOutcome::Matched {
                    status: response.status,
                }
            } else {
                debug!(platform = %target.name, status = response.status, "user not found");
                ProbeOutcome::NotMatched {
                    status: response.status,
                }
            }
        }
        Ok(Err(error)) => {
            warn!(platform = %target.name, url = %target.url, error = %error, "probe failed");
            ProbeOutcome::Failed { error }
        }
        Err(_) => {
            let error = ProbeError::timeout(&target.url, timeout);
            warn!(platform = %target.name, url = %target.url, error = %error, "probe failed");
            ProbeOutcome::Failed { error }
        }
    };

    ProbeReport {
        name: target.name,
        url: target.url,
        outcome,
        elapsed: started.elapsed(),
    }
}
