//! Parallel reader for a dynamic `address[]` in contract storage

use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::{Address, U256};
use blacklist_core::{decode_address, decode_length, has_dirty_high_bits, ArraySlots, Error, ScanConfig};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::pool::{PoolError, WorkerPool};
use crate::ports::StorageReadPort;

/// Addresses read from the array, in array order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayRead {
    /// Length stored on chain, before any clamp
    pub on_chain_length: u64,
    pub addresses: Vec<Address>,
}

pub struct ParallelStorageReader<S> {
    storage: Arc<S>,
    container: Address,
    slots: ArraySlots,
    max_elements: Option<u64>,
    length_pool: WorkerPool,
    element_pool: WorkerPool,
}

impl<S: StorageReadPort + 'static> ParallelStorageReader<S> {
    pub fn new(storage: Arc<S>, config: &ScanConfig) -> Self {
        let element_pool = WorkerPool::new(metrics::STAGE_ELEMENTS, config.concurrency)
            .with_retry(config.retry)
            .with_call_timeout(config.call_timeout());
        let length_pool = WorkerPool::new(metrics::STAGE_LENGTH, 1)
            .with_retry(config.retry)
            .with_call_timeout(config.call_timeout());

        Self {
            storage,
            container: config.array_container,
            slots: ArraySlots::new(config.base_slot),
            max_elements: config.max_elements,
            length_pool,
            element_pool,
        }
    }

    /// Read the length cell once and the clamped element range after it
    pub async fn read(&self) -> Result<ArrayRead, Error> {
        let on_chain_length = self.read_length().await?;
        let length = self.effective_length(on_chain_length);

        info!(
            container = %self.container,
            on_chain_length,
            reading = length,
            data_slot = %format!("{:#x}", self.slots.data_slot()),
            "Reading array elements"
        );

        let addresses = self.read_elements(length).await?;
        Ok(ArrayRead {
            on_chain_length,
            addresses,
        })
    }

    /// Raw length stored at the base slot
    pub async fn read_length(&self) -> Result<u64, Error> {
        let slot = self.slots.length_slot();
        let started = Instant::now();

        let cell = self
            .length_pool
            .run_one(|| self.storage.read_cell(self.container, slot))
            .await
            .map_err(|source| Error::LengthRead { slot, source })?;

        let length = decode_length(cell)?;
        metrics::set_array_length(length);
        metrics::record_stage(metrics::STAGE_LENGTH, 1, started.elapsed());
        Ok(length)
    }

    /// `min(length, max_elements)`
    pub fn effective_length(&self, length: u64) -> u64 {
        match self.max_elements {
            Some(max) => length.min(max),
            None => length,
        }
    }

    /// Read elements `0..length`; position `i` of the output is element `i`
    pub async fn read_elements(&self, length: u64) -> Result<Vec<Address>, Error> {
        let count = usize::try_from(length)
            .map_err(|_| Error::Decode(format!("array length {length} exceeds usize")))?;
        let started = Instant::now();

        let storage = self.storage.clone();
        let container = self.container;
        let slots = self.slots;

        let cells = self
            .element_pool
            .run(count, move |offset| {
                let storage = storage.clone();
                let slot = slots.element(offset as u64);
                async move { storage.read_cell(container, slot).await }
            })
            .await
            .map_err(|e| match e {
                PoolError::Task { index, error } => Error::ElementRead {
                    offset: index as u64,
                    slot: slots.element(index as u64),
                    source: error,
                },
                PoolError::Worker(msg) => Error::Worker(msg),
            })?;

        let mut addresses = Vec::with_capacity(cells.len());
        for (offset, cell) in cells.into_iter().enumerate() {
            if has_dirty_high_bits(&cell) {
                warn!(offset, cell = %cell, "Element cell has non-zero high bits");
            }
            let address = decode_address(cell);
            debug!(offset, address = %address, "Read element");
            addresses.push(address);
        }

        metrics::record_stage(metrics::STAGE_ELEMENTS, addresses.len(), started.elapsed());
        Ok(addresses)
    }
}
