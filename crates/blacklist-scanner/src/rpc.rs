//! alloy-backed JSON-RPC client implementing both ports
//!
//! Storage reads go out as `eth_getStorageAt` and view calls as `eth_call`,
//! both against the block chosen at construction.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockId, TransactionInput, TransactionRequest};
use alloy_transport::{RpcError, TransportError};
use async_trait::async_trait;
use blacklist_core::{Error, MethodDescriptor, PortError};
use tracing::info;

use crate::ports::{ReadOnlyCallPort, StorageReadPort};

/// JSON-RPC client serving storage reads and view calls
///
/// Cloning is cheap and every clone shares one HTTP connection pool, so a
/// single instance is shared by all workers.
#[derive(Clone)]
pub struct RpcLedgerClient {
    provider: DynProvider,
    block: BlockId,
}

impl std::fmt::Debug for RpcLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedgerClient")
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

impl RpcLedgerClient {
    /// Connect and probe the endpoint with `eth_chainId`
    pub async fn connect(rpc_url: &str, block: Option<u64>) -> Result<Self, Error> {
        let connection_error = |source: PortError| Error::Connection {
            endpoint: rpc_url.to_string(),
            source,
        };

        // Read-only: no nonce/gas/chain-id fillers
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect(rpc_url)
            .await
            .map_err(|e| connection_error(port_error(e)))?
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| connection_error(port_error(e)))?;

        let client = Self::new(provider, block);
        info!(rpc = %rpc_url, chain_id, block = ?client.block, "Connected to node");
        Ok(client)
    }

    pub fn new(provider: DynProvider, block: Option<u64>) -> Self {
        let block = match block {
            Some(number) => BlockId::number(number),
            None => BlockId::latest(),
        };
        Self { provider, block }
    }

    pub async fn block_number(&self) -> Result<u64, PortError> {
        self.provider.get_block_number().await.map_err(port_error)
    }
}

#[async_trait]
impl StorageReadPort for RpcLedgerClient {
    async fn read_cell(&self, container: Address, slot: U256) -> Result<B256, PortError> {
        let value = self
            .provider
            .get_storage_at(container, slot)
            .block_id(self.block)
            .await
            .map_err(port_error)?;
        Ok(B256::from(value.to_be_bytes::<32>()))
    }
}

#[async_trait]
impl ReadOnlyCallPort for RpcLedgerClient {
    async fn call(&self, target: Address, method: &MethodDescriptor) -> Result<Bytes, PortError> {
        let tx = TransactionRequest::default()
            .to(target)
            .input(TransactionInput::new(method.calldata()));

        self.provider
            .call(tx)
            .block(self.block)
            .await
            .map_err(port_error)
    }
}

/// Split transport failures (retryable) from node-side errors
fn port_error(err: TransportError) -> PortError {
    match err {
        RpcError::Transport(kind) => PortError::Connection(kind.to_string()),
        RpcError::ErrorResp(payload) => {
            PortError::Remote(format!("{} (code {})", payload.message, payload.code))
        }
        RpcError::NullResp => PortError::MalformedResponse("null response".into()),
        err @ RpcError::DeserError { .. } => PortError::MalformedResponse(err.to_string()),
        other => PortError::Remote(other.to_string()),
    }
}
