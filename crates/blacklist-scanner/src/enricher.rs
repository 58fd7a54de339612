//! Per-address view calls

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::Address;
use blacklist_core::{EnrichedRecord, Error, MethodDescriptor, PortError, ScanConfig};
use tracing::{debug, info};

use crate::metrics;
use crate::pool::{PoolError, WorkerPool};
use crate::ports::ReadOnlyCallPort;

/// Calls one fixed view method on every address and keeps the `uint256` result
pub struct ContractCallEnricher<C> {
    calls: Arc<C>,
    method: Arc<MethodDescriptor>,
    pool: WorkerPool,
}

impl<C: ReadOnlyCallPort + 'static> ContractCallEnricher<C> {
    pub fn new(calls: Arc<C>, method: MethodDescriptor, config: &ScanConfig) -> Self {
        let pool = WorkerPool::new(metrics::STAGE_ENRICH, config.concurrency)
            .with_retry(config.retry)
            .with_call_timeout(config.call_timeout());
        Self {
            calls,
            method: Arc::new(method),
            pool,
        }
    }

    /// One record per input address, in input order
    pub async fn enrich(&self, addresses: &[Address]) -> Result<Vec<EnrichedRecord>, Error> {
        info!(
            addresses = addresses.len(),
            method = %self.method,
            concurrency = self.pool.concurrency(),
            "Enriching addresses"
        );
        let started = Instant::now();

        let targets: Arc<Vec<Address>> = Arc::new(addresses.to_vec());
        let calls = self.calls.clone();
        let method = self.method.clone();
        let op_targets = targets.clone();

        let records = self
            .pool
            .run(targets.len(), move |index| {
                let calls = calls.clone();
                let method = method.clone();
                let address = op_targets[index];
                async move {
                    let output = calls.call(address, &method).await?;
                    let attribute = method.decode_uint(&output)?;
                    debug!(address = %address, attribute = %attribute, "Enriched");
                    Ok::<_, PortError>(EnrichedRecord::new(address, attribute))
                }
            })
            .await
            .map_err(|e| match e {
                PoolError::Task { index, error } => Error::Enrichment {
                    address: targets[index],
                    source: error,
                },
                PoolError::Worker(msg) => Error::Worker(msg),
            })?;

        metrics::record_stage(metrics::STAGE_ENRICH, records.len(), started.elapsed());
        Ok(records)
    }
}
