//! Scan configuration

use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::method::MethodDescriptor;
use crate::{Error, Result};

/// Default number of in-flight remote operations per stage
pub const DEFAULT_CONCURRENCY: usize = 10;

/// View method queried on every discovered game
pub const DEFAULT_METHOD_SIGNATURE: &str = "l2BlockNumber()";

/// Slot of `_disputeGameList` in the DisputeGameFactory layout
const DEFAULT_ARRAY_SLOT: u64 = 104;

/// Retry behaviour for transient remote failures
///
/// `max_retries = 0` aborts on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 200,
            exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, exponential_backoff: bool) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            exponential_backoff,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let ms = if self.exponential_backoff {
            let shift = attempt.saturating_sub(1).min(16);
            self.initial_delay_ms.saturating_mul(1u64 << shift)
        } else {
            self.initial_delay_ms
        };
        Duration::from_millis(ms)
    }
}

/// Configuration of one scan
///
/// Built once at startup, validated, then handed to the pipeline by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// L1 JSON-RPC endpoint
    pub rpc_url: String,
    /// Contract holding the `address[]` (the dispute game factory)
    pub array_container: Address,
    /// Slot storing the array length
    #[serde(default = "default_base_slot")]
    pub base_slot: U256,
    /// Only read the first N elements
    #[serde(default)]
    pub max_elements: Option<u64>,
    /// Max in-flight remote operations per stage
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Minimum L2 block number for a game to be retained
    pub divergence_threshold: U256,
    #[serde(default = "default_method_signature")]
    pub method_signature: String,
    /// Pin every read to this block (latest when unset)
    #[serde(default)]
    pub block: Option<u64>,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per remote operation
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    /// Whole pipeline
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

fn default_base_slot() -> U256 {
    U256::from(DEFAULT_ARRAY_SLOT)
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_method_signature() -> String {
    DEFAULT_METHOD_SIGNATURE.to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            array_container: Address::ZERO,
            base_slot: default_base_slot(),
            max_elements: None,
            concurrency: DEFAULT_CONCURRENCY,
            divergence_threshold: U256::ZERO,
            method_signature: default_method_signature(),
            block: None,
            retry: RetryPolicy::default(),
            call_timeout_ms: None,
            deadline_ms: None,
        }
    }
}

impl ScanConfig {
    pub fn new(rpc_url: impl Into<String>, array_container: Address) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            array_container,
            ..Default::default()
        }
    }

    pub fn with_base_slot(mut self, slot: U256) -> Self {
        self.base_slot = slot;
        self
    }

    pub fn with_max_elements(mut self, max: Option<u64>) -> Self {
        self.max_elements = max;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_threshold(mut self, threshold: U256) -> Self {
        self.divergence_threshold = threshold;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    /// Check required fields before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(Error::Configuration("rpc_url is not set".into()));
        }
        if !self.rpc_url.contains("://") {
            return Err(Error::Configuration(format!(
                "rpc_url {:?} is missing a scheme",
                self.rpc_url
            )));
        }
        if self.array_container == Address::ZERO {
            return Err(Error::Configuration(
                "array container address is not set".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency must be at least 1".into()));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(Error::Configuration("call timeout must be non-zero".into()));
        }
        if self.deadline_ms == Some(0) {
            return Err(Error::Configuration("deadline must be non-zero".into()));
        }
        self.method()?;
        Ok(())
    }

    /// Descriptor of the configured view method
    pub fn method(&self) -> Result<MethodDescriptor> {
        MethodDescriptor::from_signature(&self.method_signature)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
