//! ledgerd - Main Entry Point
//! Development ledger behind a coordinated JSON-RPC server

mod config;
mod dev_ledger;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use config::{DaemonConfig, LogFormat};
use dev_ledger::DevLedger;
use ledgerd_api_rpc::RpcServer;
use ledgerd_core::application::Provider;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("ledgerd=info"))?;

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

fn build_provider(config: &DaemonConfig) -> ledgerd_core::Result<Arc<Provider<DevLedger>>> {
    let ledger = Arc::new(DevLedger::new(config.accounts, config.startup_delay));
    let provider = Provider::initialize(&config.provider, ledger)?;
    Ok(Arc::new(provider))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    init_logging(config.log_format)?;
    info!("ledgerd v{} starting...", VERSION);
    info!(
        policy = %config.provider.concurrency_policy(),
        accounts = config.accounts,
        "Configuration loaded"
    );

    // 3. Setup ledger and provider (requests buffer until the ledger is ready)
    let provider = build_provider(&config)?;

    // 4. Start JSON-RPC server
    let rpc_server = RpcServer::new(config.rpc.clone(), provider.clone());
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(%addr, "System ready. Waiting for requests...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    provider.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, rpc_handle.stopped())
        .await
        .is_err()
    {
        tracing::warn!("RPC server did not stop within {:?}", SHUTDOWN_TIMEOUT);
    }

    info!("Shutdown complete.");

    Ok(())
}
