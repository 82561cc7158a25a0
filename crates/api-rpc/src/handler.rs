//! RPC Method Handler
//!
//! Forwards every exposed ledger method into the provider and turns the
//! settled call result into a JSON-RPC response.

use crate::error::{call_error_to_rpc, coordinator_error_to_rpc};
use jsonrpsee::types::ErrorObjectOwned;
use ledgerd_core::application::{CoordinatorStats, Provider};
use ledgerd_core::port::Ledger;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// RPC Handler with injected provider
pub struct RpcHandler<L: Ledger> {
    provider: Arc<Provider<L>>,
}

impl<L: Ledger> RpcHandler<L> {
    pub fn new(provider: Arc<Provider<L>>) -> Self {
        Self { provider }
    }

    /// Methods to register on the RPC module
    pub fn methods(&self) -> Vec<&'static str> {
        self.provider.exposed_methods()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.provider.stats()
    }

    /// Submit one call and wait for its settled result
    pub async fn dispatch(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ErrorObjectOwned> {
        let handle = self
            .provider
            .request(method, params)
            .map_err(coordinator_error_to_rpc)?;
        let sequence = handle.sequence();

        match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                debug!(sequence, method, error = %err, "Call failed");
                Err(call_error_to_rpc(err))
            }
            Err(err) => {
                debug!(sequence, method, error = %err, "Request not executed");
                Err(coordinator_error_to_rpc(err))
            }
        }
    }
}
