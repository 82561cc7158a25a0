// Request Intake Port

use crate::application::coordinator::TaskHandle;
use crate::domain::{CallResult, CoordinatorError, Params};
use std::sync::Arc;

/// An inbound method invocation addressed to one ledger instance
#[derive(Debug)]
pub struct Request<L> {
    pub ledger: Arc<L>,
    pub method: String,
    pub params: Params,
}

impl<L> Request<L> {
    pub fn new(ledger: Arc<L>, method: impl Into<String>, params: Params) -> Self {
        Self {
            ledger,
            method: method.into(),
            params,
        }
    }
}

/// Accepts requests and returns a handle to their eventual result.
///
/// Admission happens synchronously inside `handle`, so arrival order is the
/// order of `handle` calls, not the order in which handles are awaited.
pub trait RequestHandler<L>: Send + Sync {
    /// # Errors
    /// - CoordinatorError::Disposed if the handler no longer accepts work
    fn handle(&self, request: Request<L>) -> Result<TaskHandle<CallResult>, CoordinatorError>;
}
