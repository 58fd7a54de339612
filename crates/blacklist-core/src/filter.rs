//! Threshold filter over enriched records

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An address together with the value its view method returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub address: Address,
    pub attribute: U256,
}

impl EnrichedRecord {
    pub fn new(address: Address, attribute: U256) -> Self {
        Self { address, attribute }
    }
}

/// Keep the addresses whose attribute is `>= threshold`, in input order
pub fn filter_by_threshold(records: &[EnrichedRecord], threshold: U256) -> Vec<Address> {
    records
        .iter()
        .filter(|record| record.attribute >= threshold)
        .map(|record| record.address)
        .collect()
}
