//! RPC Error Types
//!
//! Maps call and coordinator failures to JSON-RPC error objects.

use jsonrpsee::types::ErrorObjectOwned;
use ledgerd_core::domain::{CallError, CoordinatorError, LedgerError};
use serde_json::json;

/// JSON-RPC error codes
pub mod code {
    pub const INVALID_PARAMS: i32 = -32602;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Ledger operation ran and failed
    pub const SERVER_ERROR: i32 = -32000;
    /// Provider no longer accepts requests
    pub const UNAVAILABLE: i32 = -32002;
}

/// Convert a failed call to a JSON-RPC error object
///
/// `data.kind` carries the machine-checkable failure kind.
pub fn call_error_to_rpc(err: CallError) -> ErrorObjectOwned {
    let data = Some(json!({ "kind": err.kind() }));
    match err {
        CallError::Validation(msg) => ErrorObjectOwned::owned(code::METHOD_NOT_FOUND, msg, data),
        CallError::Execution(LedgerError::InvalidParams(msg)) => {
            ErrorObjectOwned::owned(code::INVALID_PARAMS, msg, data)
        }
        CallError::Execution(cause) => {
            ErrorObjectOwned::owned(code::SERVER_ERROR, cause.to_string(), data)
        }
    }
}

/// Convert a coordinator-level failure to a JSON-RPC error object
pub fn coordinator_error_to_rpc(err: CoordinatorError) -> ErrorObjectOwned {
    match err {
        CoordinatorError::Disposed => {
            ErrorObjectOwned::owned(code::UNAVAILABLE, err.to_string(), None::<()>)
        }
        CoordinatorError::TaskPanicked(_)
        | CoordinatorError::InvalidLimit(_)
        | CoordinatorError::NoRuntime => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, err.to_string(), None::<()>)
        }
    }
}
