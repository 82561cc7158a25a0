//! JSON-RPC Server
//!
//! Serves JSON-RPC 2.0 over HTTP. Only operations the ledger exposes are
//! registered, so anything else is rejected by the server before reaching
//! the provider.

use crate::handler::RpcHandler;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use ledgerd_core::application::Provider;
use ledgerd_core::port::Ledger;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 8545;

/// RPC Server Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcServerConfig {
    pub host: String,
    /// `0` binds an ephemeral port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Server startup errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to build server on {addr}: {reason}")]
    Build { addr: String, reason: String },

    #[error("Failed to register method {method}: {reason}")]
    Register { method: &'static str, reason: String },
}

/// RPC Server
pub struct RpcServer<L: Ledger> {
    config: RpcServerConfig,
    handler: Arc<RpcHandler<L>>,
}

impl<L: Ledger> RpcServer<L> {
    pub fn new(config: RpcServerConfig, provider: Arc<Provider<L>>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(provider)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port `0`) and the handle used
    /// to stop the server.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| ServerError::Build {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        let local_addr = server.local_addr().map_err(|e| ServerError::Build {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

        let mut module = RpcModule::new(());

        // One method per exposed ledger operation
        for method in self.handler.methods() {
            let handler = self.handler.clone();
            module
                .register_async_method(method, move |params, _, _| {
                    let handler = handler.clone();
                    async move {
                        let params: Option<Vec<Value>> = params.parse()?;
                        handler.dispatch(method, params.unwrap_or_default()).await
                    }
                })
                .map_err(|e| ServerError::Register {
                    method,
                    reason: e.to_string(),
                })?;
            debug!(method, "Registered RPC method");
        }

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
