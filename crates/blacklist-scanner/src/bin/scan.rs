//! Dispute game blacklist scanner
//!
//! Run with:
//! ```bash
//! cargo run -p blacklist-scanner --bin blacklist-scan -- \
//!     --rpc-url http://localhost:8545 \
//!     --factory 0xd6E6dBf4F7EA0ac412fD8b65ED297e64BB7a06E1 \
//!     --threshold 1 \
//!     --format env:BLACKLISTED_GAMES
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use blacklist_core::{render_addresses, Error, OutputFormat, ScanConfig};
use blacklist_scanner::{Pipeline, RpcLedgerClient};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "blacklist-scan")]
#[command(about = "List dispute games at or above an L2 divergence block")]
struct Args {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// L1 RPC URL
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Contract holding the game list (DisputeGameFactory proxy)
    #[arg(long, env = "FACTORY_ADDRESS")]
    factory: Option<Address>,

    /// Storage slot of the array length (decimal or 0x-hex)
    #[arg(long, env = "ARRAY_SLOT")]
    array_slot: Option<U256>,

    /// Only read the first N games
    #[arg(long, env = "MAX_ELEMENTS")]
    max_elements: Option<u64>,

    /// Max in-flight requests per stage
    #[arg(long, env = "CONCURRENCY")]
    concurrency: Option<usize>,

    /// Keep games whose l2BlockNumber is >= this value
    #[arg(long, env = "L2_DIVERGENCE_BLOCK_NUMBER")]
    threshold: Option<U256>,

    /// View method returning a uint256
    #[arg(long)]
    method: Option<String>,

    /// Pin all reads to this L1 block
    #[arg(long, env = "BLOCK_NUMBER")]
    block: Option<u64>,

    /// Retries per request on connection errors and timeouts
    #[arg(long)]
    retries: Option<u32>,

    /// Initial retry delay in milliseconds (doubles per attempt)
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    call_timeout_ms: Option<u64>,

    /// Whole-scan deadline in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// csv, json, lines, env or env:KEY
    #[arg(long, default_value = "csv")]
    format: OutputFormat,

    /// Write the list to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Args {
    /// Without `--config`, the endpoint and threshold must come from flags or env
    fn into_config(self) -> blacklist_core::Result<(ScanConfig, OutputFormat, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => {
                if self.rpc_url.is_none() {
                    return Err(Error::Configuration(
                        "--rpc-url (or RPC_URL) is required without --config".into(),
                    ));
                }
                if self.threshold.is_none() {
                    return Err(Error::Configuration(
                        "--threshold (or L2_DIVERGENCE_BLOCK_NUMBER) is required without --config"
                            .into(),
                    ));
                }
                ScanConfig::default()
            }
        };

        if let Some(rpc_url) = self.rpc_url {
            config.rpc_url = rpc_url;
        }
        if let Some(factory) = self.factory {
            config.array_container = factory;
        }
        if let Some(slot) = self.array_slot {
            config.base_slot = slot;
        }
        if self.max_elements.is_some() {
            config.max_elements = self.max_elements;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(threshold) = self.threshold {
            config.divergence_threshold = threshold;
        }
        if let Some(method) = self.method {
            config.method_signature = method;
        }
        if self.block.is_some() {
            config.block = self.block;
        }
        if let Some(retries) = self.retries {
            config.retry.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.initial_delay_ms = delay;
        }
        if self.call_timeout_ms.is_some() {
            config.call_timeout_ms = self.call_timeout_ms;
        }
        if self.deadline_ms.is_some() {
            config.deadline_ms = self.deadline_ms;
        }

        config.validate()?;
        Ok((config, self.format, self.output))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("blacklist_scanner=info".parse()?))
        .init();

    let (config, format, output) = Args::parse().into_config()?;

    let client = Arc::new(RpcLedgerClient::connect(&config.rpc_url, config.block).await?);
    let pipeline = Pipeline::new(config, client.clone(), client)?;
    let outcome = pipeline.run().await?;

    info!(
        games = outcome.on_chain_length,
        scanned = outcome.scanned.len(),
        retained = outcome.retained.len(),
        "Found dispute games at or above threshold"
    );

    let rendered = render_addresses(&outcome.retained, &format);
    match output {
        Some(path) => {
            std::fs::write(&path, format!("{rendered}\n"))?;
            info!(path = %path.display(), "Wrote address list");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
