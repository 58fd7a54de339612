//! Remote operations the scanner depends on
//!
//! Implementations are shared through `Arc` by every worker of a stage and
//! must tolerate concurrent calls.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use blacklist_core::{MethodDescriptor, PortError};

/// Point-read of one 32-byte storage cell
#[async_trait]
pub trait StorageReadPort: Send + Sync {
    async fn read_cell(&self, container: Address, slot: U256) -> Result<B256, PortError>;
}

/// Read-only call of a fixed-signature method, returning the raw output
#[async_trait]
pub trait ReadOnlyCallPort: Send + Sync {
    async fn call(&self, target: Address, method: &MethodDescriptor) -> Result<Bytes, PortError>;
}
