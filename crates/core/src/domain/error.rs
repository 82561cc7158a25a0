// Domain Error Types

use thiserror::Error;

/// Errors raised by the coordinator itself, never by the work it runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Construction with a negative concurrency limit
    #[error("Invalid concurrency limit: {0} (must be >= 0)")]
    InvalidLimit(i64),

    /// Submission to (or backlog entry dropped by) a disposed coordinator
    #[error("Coordinator has been disposed")]
    Disposed,

    /// The task body panicked; its slot was still released
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// Construction outside a tokio runtime with no handle supplied
    #[error("Coordinator requires a tokio runtime")]
    NoRuntime,
}

/// Failure reported by a ledger operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Failed(String),

    #[error("Ledger not initialized: {0}")]
    NotInitialized(String),

    #[error("Operation panicked: {0}")]
    Panicked(String),
}
