//! Bounded fan-out shared by the storage reader and the call enricher
//!
//! A batch runs on at most `concurrency` worker tasks. Workers claim the next
//! unclaimed index from a shared counter until the batch is drained, so the
//! number of live tasks never depends on the batch size. Results are merged
//! by index, so the output order never depends on completion order.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use blacklist_core::{PortError, RetryPolicy};
use tokio::task::JoinSet;
use tracing::warn;

use crate::metrics;

/// Failure of a pooled batch
#[derive(Debug)]
pub(crate) enum PoolError {
    /// Item `index` failed (after retries, if any)
    Task { index: usize, error: PortError },
    /// A worker task panicked or was cancelled
    Worker(String),
}

/// Fixed-size pool for one stage of remote operations
#[derive(Debug, Clone)]
pub(crate) struct WorkerPool {
    stage: &'static str,
    concurrency: usize,
    retry: RetryPolicy,
    call_timeout: Option<Duration>,
}

impl WorkerPool {
    pub(crate) fn new(stage: &'static str, concurrency: usize) -> Self {
        Self {
            stage,
            concurrency: concurrency.max(1),
            retry: RetryPolicy::default(),
            call_timeout: None,
        }
    }

    pub(crate) fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `op(index)` for every index in `0..count`
    ///
    /// The first failure aborts every worker still running.
    pub(crate) async fn run<T, F, Fut>(&self, count: usize, op: F) -> Result<Vec<T>, PoolError>
    where
        T: Send + 'static,
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PortError>> + Send + 'static,
    {
        if count == 0 {
            return Ok(Vec::new());
        }

        let next = Arc::new(AtomicUsize::new(0));
        let op = Arc::new(op);
        let mut workers = JoinSet::new();

        for _ in 0..self.concurrency.min(count) {
            let pool = self.clone();
            let next = next.clone();
            let op = op.clone();
            workers.spawn(async move {
                let mut done = Vec::new();
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= count {
                        return Ok(done);
                    }
                    match pool.attempt(|| op(index)).await {
                        Ok(value) => done.push((index, value)),
                        Err(error) => return Err((index, error)),
                    }
                }
            });
        }

        let mut merged = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(done)) => merged.extend(done),
                Ok(Err((index, error))) => {
                    workers.abort_all();
                    return Err(PoolError::Task { index, error });
                }
                Err(e) => {
                    workers.abort_all();
                    return Err(PoolError::Worker(e.to_string()));
                }
            }
        }

        if merged.len() != count {
            return Err(PoolError::Worker(format!(
                "expected {count} results, got {}",
                merged.len()
            )));
        }
        merged.sort_unstable_by_key(|(index, _)| *index);
        Ok(merged.into_iter().map(|(_, value)| value).collect())
    }

    /// A single remote operation under the same timeout and retry rules
    pub(crate) async fn run_one<T, F, Fut>(&self, op: F) -> Result<T, PortError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PortError>>,
    {
        self.attempt(op).await
    }

    async fn attempt<T, F, Fut>(&self, op: F) -> Result<T, PortError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PortError>>,
    {
        let mut retries = 0u32;
        loop {
            match self.timed(op()).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.delay(retries);
                    metrics::record_retry(self.stage);
                    warn!(
                        stage = self.stage,
                        attempt = retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying remote operation"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, PortError>>,
    ) -> Result<T, PortError> {
        let started = Instant::now();
        let _in_flight = InFlightGuard::enter(self.stage);

        let result = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .unwrap_or(Err(PortError::Timeout(limit))),
            None => fut.await,
        };

        let outcome = match &result {
            Ok(_) => metrics::OUTCOME_OK,
            Err(PortError::Timeout(_)) => metrics::OUTCOME_TIMEOUT,
            Err(_) => metrics::OUTCOME_ERROR,
        };
        metrics::record_remote_op(self.stage, outcome, started.elapsed());
        result
    }
}

/// Holds one slot of the in-flight gauge; released on drop, including when
/// the owning task is aborted mid-request
struct InFlightGuard {
    stage: &'static str,
}

impl InFlightGuard {
    fn enter(stage: &'static str) -> Self {
        metrics::record_remote_in_flight(stage, 1.0);
        Self { stage }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        metrics::record_remote_in_flight(self.stage, -1.0);
    }
}
