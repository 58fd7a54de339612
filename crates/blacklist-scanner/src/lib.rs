//! Concurrent storage-array scanner for the dispute game blacklist
//!
//! This crate provides the network-facing half of the scan:
//! 1. Reads the length of a dynamic `address[]` straight from contract storage
//! 2. Reads every element slot with bounded concurrency, keeping array order
//! 3. Calls a read-only method on each discovered address (bounded as well)
//! 4. Keeps the addresses whose returned value meets the divergence threshold
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use blacklist_core::ScanConfig;
//! use blacklist_scanner::{Pipeline, RpcLedgerClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScanConfig::new(
//!         "http://localhost:8545",
//!         "0xd6E6dBf4F7EA0ac412fD8b65ED297e64BB7a06E1".parse()?,
//!     );
//!     let client = Arc::new(RpcLedgerClient::connect(&config.rpc_url, config.block).await?);
//!     let outcome = Pipeline::new(config, client.clone(), client)?.run().await?;
//!     println!("{} games retained", outcome.retained.len());
//!     Ok(())
//! }
//! ```

mod enricher;
pub mod metrics;
mod pipeline;
mod pool;
mod ports;
mod reader;
mod rpc;

pub use enricher::ContractCallEnricher;
pub use pipeline::{Pipeline, ScanOutcome};
pub use ports::{ReadOnlyCallPort, StorageReadPort};
pub use reader::{ArrayRead, ParallelStorageReader};
pub use rpc::RpcLedgerClient;
