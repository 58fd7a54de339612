//! Read -> enrich -> filter

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::Address;
use blacklist_core::{filter_by_threshold, EnrichedRecord, Error, ScanConfig};
use tracing::info;

use crate::enricher::ContractCallEnricher;
use crate::metrics;
use crate::ports::{ReadOnlyCallPort, StorageReadPort};
use crate::reader::ParallelStorageReader;

/// Everything a scan produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Length stored on chain (before `max_elements`)
    pub on_chain_length: u64,
    /// Addresses read, in array order
    pub scanned: Vec<Address>,
    pub records: Vec<EnrichedRecord>,
    /// Addresses at or above the divergence threshold
    pub retained: Vec<Address>,
}

/// One validated scan, ready to run
pub struct Pipeline<S, C> {
    config: ScanConfig,
    reader: ParallelStorageReader<S>,
    enricher: ContractCallEnricher<C>,
}

impl<S, C> Pipeline<S, C>
where
    S: StorageReadPort + 'static,
    C: ReadOnlyCallPort + 'static,
{
    /// Validates `config`; nothing touches the network yet
    pub fn new(config: ScanConfig, storage: Arc<S>, calls: Arc<C>) -> Result<Self, Error> {
        config.validate()?;
        let method = config.method()?;
        let reader = ParallelStorageReader::new(storage, &config);
        let enricher = ContractCallEnricher::new(calls, method, &config);
        Ok(Self {
            config,
            reader,
            enricher,
        })
    }

    /// Run every stage, stopping at the first failure
    pub async fn run(&self) -> Result<ScanOutcome, Error> {
        match self.config.deadline() {
            Some(deadline) => tokio::time::timeout(deadline, self.run_stages())
                .await
                .map_err(|_| Error::Deadline(deadline))?,
            None => self.run_stages().await,
        }
    }

    async fn run_stages(&self) -> Result<ScanOutcome, Error> {
        let started = Instant::now();
        info!(
            container = %self.config.array_container,
            base_slot = %self.config.base_slot,
            max_elements = ?self.config.max_elements,
            concurrency = self.config.concurrency,
            threshold = %self.config.divergence_threshold,
            "Starting scan"
        );

        let read = self.reader.read().await?;
        let records = self.enricher.enrich(&read.addresses).await?;
        let retained = filter_by_threshold(&records, self.config.divergence_threshold);
        metrics::set_retained(retained.len());

        info!(
            on_chain_length = read.on_chain_length,
            scanned = read.addresses.len(),
            retained = retained.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(ScanOutcome {
            on_chain_length: read.on_chain_length,
            scanned: read.addresses,
            records,
            retained,
        })
    }
}
