//! Daemon configuration from environment variables

use ledgerd_api_rpc::RpcServerConfig;
use ledgerd_core::application::ProviderOptions;
use ledgerd_core::domain::ConcurrencyPolicy;
use ledgerd_core::error::{AppError, Result};
use std::str::FromStr;
use std::time::Duration;

const ENV_RPC_HOST: &str = "LEDGERD_RPC_HOST";
const ENV_RPC_PORT: &str = "LEDGERD_RPC_PORT";
const ENV_ASYNC_REQUESTS: &str = "LEDGERD_ASYNC_REQUESTS";
const ENV_CONCURRENCY: &str = "LEDGERD_CONCURRENCY";
const ENV_ACCOUNTS: &str = "LEDGERD_ACCOUNTS";
const ENV_STARTUP_DELAY_MS: &str = "LEDGERD_STARTUP_DELAY_MS";
const ENV_LOG_FORMAT: &str = "LEDGERD_LOG_FORMAT";

const DEFAULT_ACCOUNTS: usize = 10;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development: pretty formatting with colors
    Pretty,
    /// Production: JSON structured logging
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc: RpcServerConfig,
    pub provider: ProviderOptions,
    pub accounts: usize,
    pub startup_delay: Duration,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RpcServerConfig::default();
        let rpc = RpcServerConfig {
            host: lookup(ENV_RPC_HOST).unwrap_or(defaults.host),
            port: parse_var(&lookup, ENV_RPC_PORT)?.unwrap_or(defaults.port),
        };

        let async_request_processing = match lookup(ENV_ASYNC_REQUESTS) {
            Some(raw) => parse_bool(ENV_ASYNC_REQUESTS, &raw)?,
            None => ProviderOptions::default().async_request_processing,
        };

        let concurrency_limit = match parse_var::<i64, _>(&lookup, ENV_CONCURRENCY)? {
            Some(limit) => {
                let policy = ConcurrencyPolicy::try_from(limit)
                    .map_err(|e| AppError::Config(format!("{}: {}", ENV_CONCURRENCY, e)))?;
                Some(policy.limit())
            }
            None => None,
        };

        let log_format = match lookup(ENV_LOG_FORMAT).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            rpc,
            provider: ProviderOptions {
                async_request_processing,
                concurrency_limit,
            },
            accounts: parse_var(&lookup, ENV_ACCOUNTS)?.unwrap_or(DEFAULT_ACCOUNTS),
            startup_delay: Duration::from_millis(
                parse_var(&lookup, ENV_STARTUP_DELAY_MS)?.unwrap_or(0),
            ),
            log_format,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{}={:?}: expected a boolean", key, raw))),
    }
}
