//! JSON-RPC API Layer
//!
//! Exposes every permitted ledger operation as a JSON-RPC 2.0 method and
//! forwards calls through the provider's coordinator and executor.

pub mod error;
pub mod handler;
pub mod server;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig, ServerError};
