//! In-memory development ledger
//!
//! Deterministic accounts and a block counter. Enough chain state to serve
//! the handful of methods a client needs to talk to the daemon.

use async_trait::async_trait;
use ledgerd_core::domain::{LedgerError, Params};
use ledgerd_core::port::{parse_param, Ledger, MethodRegistry};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::info;

const CHAIN_ID: u64 = 1337;
/// 1000 ether in wei
const INITIAL_BALANCE: u128 = 1_000 * 1_000_000_000_000_000_000;

#[derive(Default)]
struct ChainState {
    initialized: bool,
    block_number: u64,
    accounts: Vec<String>,
    balances: HashMap<String, u128>,
}

pub struct DevLedger {
    state: RwLock<ChainState>,
    account_count: usize,
    startup_delay: Duration,
}

impl DevLedger {
    pub fn new(account_count: usize, startup_delay: Duration) -> Self {
        Self {
            state: RwLock::new(ChainState::default()),
            account_count,
            startup_delay,
        }
    }

    async fn client_version(&self) -> Result<Value, LedgerError> {
        Ok(json!(format!("ledgerd/v{}", ledgerd_core::VERSION)))
    }

    async fn net_version(&self) -> Result<Value, LedgerError> {
        Ok(json!(CHAIN_ID.to_string()))
    }

    async fn accounts(&self) -> Result<Value, LedgerError> {
        let state = self.initialized_state().await?;
        Ok(json!(state.accounts))
    }

    async fn block_number(&self) -> Result<Value, LedgerError> {
        let state = self.initialized_state().await?;
        Ok(json!(to_quantity(u128::from(state.block_number))))
    }

    async fn get_balance(&self, params: Params) -> Result<Value, LedgerError> {
        let address = parse_address(&parse_param::<String>(&params, 0, "address")?)?;
        let state = self.initialized_state().await?;
        let balance = state.balances.get(&address).copied().unwrap_or(0);
        Ok(json!(to_quantity(balance)))
    }

    async fn set_account_balance(&self, params: Params) -> Result<Value, LedgerError> {
        let address = parse_address(&parse_param::<String>(&params, 0, "address")?)?;
        let balance = parse_quantity(&parse_param::<String>(&params, 1, "balance")?)?;

        let mut state = self.state.write().await;
        ensure_initialized(&state)?;
        state.balances.insert(address, balance);
        Ok(json!(true))
    }

    async fn mine(&self, params: Params) -> Result<Value, LedgerError> {
        let blocks = parse_param::<Option<u64>>(&params, 0, "blocks")?.unwrap_or(1);
        if blocks == 0 {
            return Err(LedgerError::InvalidParams("blocks must be positive".to_string()));
        }

        let mut state = self.state.write().await;
        ensure_initialized(&state)?;
        let current = state.block_number;
        state.block_number = current.checked_add(blocks).ok_or_else(|| {
            LedgerError::InvalidParams(format!(
                "mining {} blocks overflows block number {}",
                blocks, current
            ))
        })?;
        Ok(json!(to_quantity(u128::from(state.block_number))))
    }

    async fn initialized_state(&self) -> Result<RwLockReadGuard<'_, ChainState>, LedgerError> {
        let state = self.state.read().await;
        ensure_initialized(&state)?;
        Ok(state)
    }
}

#[async_trait]
impl Ledger for DevLedger {
    fn expose(methods: &mut MethodRegistry<Self>) {
        methods
            .register("web3_clientVersion", |ledger, _| async move {
                ledger.client_version().await
            })
            .register("net_version", |ledger, _| async move { ledger.net_version().await })
            .register("eth_accounts", |ledger, _| async move { ledger.accounts().await })
            .register("eth_blockNumber", |ledger, _| async move {
                ledger.block_number().await
            })
            .register("eth_getBalance", |ledger, params| async move {
                ledger.get_balance(params).await
            })
            .register("evm_setAccountBalance", |ledger, params| async move {
                ledger.set_account_balance(params).await
            })
            .register("evm_mine", |ledger, params| async move { ledger.mine(params).await });
    }

    async fn initialize(&self) -> Result<(), LedgerError> {
        if !self.startup_delay.is_zero() {
            info!(
                delay_ms = self.startup_delay.as_millis() as u64,
                "Simulating slow ledger startup"
            );
            tokio::time::sleep(self.startup_delay).await;
        }

        let mut state = self.state.write().await;
        state.accounts = (1..=self.account_count)
            .map(|i| format!("0x{:040x}", i))
            .collect();
        let seeded: Vec<_> = state
            .accounts
            .iter()
            .map(|account| (account.clone(), INITIAL_BALANCE))
            .collect();
        state.balances.extend(seeded);
        state.initialized = true;

        info!(
            accounts = self.account_count,
            chain_id = CHAIN_ID,
            "Development ledger initialized"
        );
        Ok(())
    }
}

fn ensure_initialized(state: &ChainState) -> Result<(), LedgerError> {
    if state.initialized {
        Ok(())
    } else {
        Err(LedgerError::NotInitialized("development ledger".to_string()))
    }
}

fn to_quantity(value: u128) -> String {
    format!("{:#x}", value)
}

fn parse_quantity(raw: &str) -> Result<u128, LedgerError> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| {
        LedgerError::InvalidParams(format!("quantity {:?} must be 0x-prefixed", raw))
    })?;
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidParams(format!("quantity {:?}: {}", raw, e)))
}

/// Validate and lowercase a 20-byte hex address
fn parse_address(raw: &str) -> Result<String, LedgerError> {
    let valid = raw.len() == 42
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(LedgerError::InvalidParams(format!("invalid address: {}", raw)))
    }
}
