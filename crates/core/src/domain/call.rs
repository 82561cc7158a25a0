// Call Domain Model - input/output of one dispatched method invocation

use super::error::LedgerError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Positional arguments of a method call
pub type Params = Vec<Value>;

/// One method invocation against a ledger.
///
/// Built per inbound request and consumed by `Executor::execute`.
#[derive(Debug)]
pub struct CallDescriptor<L> {
    pub target: Arc<L>,
    pub method: String,
    pub params: Params,
}

impl<L> CallDescriptor<L> {
    pub fn new(target: Arc<L>, method: impl Into<String>, params: Params) -> Self {
        Self {
            target,
            method: method.into(),
            params,
        }
    }
}

/// Machine-checkable kind of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallErrorKind {
    Validation,
    Execution,
}

impl fmt::Display for CallErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

/// Structured failure of a single call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Method missing from the target's permitted operations; nothing was invoked
    #[error("Validation failure: {0}")]
    Validation(String),

    /// The operation ran and failed (error, or panic while building/polling it)
    #[error("Execution failure: {0}")]
    Execution(#[source] LedgerError),
}

impl CallError {
    pub fn kind(&self) -> CallErrorKind {
        match self {
            Self::Validation(_) => CallErrorKind::Validation,
            Self::Execution(_) => CallErrorKind::Execution,
        }
    }

    /// Human-readable message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Execution(cause) => cause.to_string(),
        }
    }
}

/// Outcome of one call, produced exactly once per descriptor
pub type CallResult = Result<Value, CallError>;
