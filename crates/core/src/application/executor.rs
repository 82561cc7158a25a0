// Executor - validated, fault-isolating method dispatch
//
// Only operations in the ledger's MethodRegistry are reachable. Every
// outcome (value, ledger error, panic before or during the call) becomes a
// CallResult; nothing propagates out of `execute`.

use crate::application::panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};
use crate::domain::{CallDescriptor, CallError, CallResult, LedgerError};
use crate::port::{Ledger, MethodRegistry};
use tracing::{debug, warn};

/// Dispatches calls against ledgers of type `L`.
///
/// Holds only the immutable permitted-operations registry; no state is
/// shared between calls.
pub struct Executor<L> {
    methods: MethodRegistry<L>,
}

impl<L: Ledger> Executor<L> {
    /// Executor over the operations `L` exposes
    pub fn new() -> Self {
        let mut methods = MethodRegistry::new();
        L::expose(&mut methods);
        debug!(methods = methods.len(), "Executor registry built");
        Self { methods }
    }
}

impl<L: Ledger> Default for Executor<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Executor<L> {
    /// Executor over an explicit registry
    pub fn with_registry(methods: MethodRegistry<L>) -> Self {
        Self { methods }
    }

    pub fn is_permitted(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    /// Permitted method names in sorted order
    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.names()
    }

    /// Run one call, single attempt, with every failure normalized.
    ///
    /// # Errors
    /// - CallError::Validation if `method` is not a permitted operation;
    ///   the target is not touched
    /// - CallError::Execution if the operation returned an error or panicked
    pub async fn execute(&self, call: CallDescriptor<L>) -> CallResult {
        let CallDescriptor {
            target,
            method,
            params,
        } = call;

        let Some(operation) = self.methods.get(&method) else {
            warn!(method = %method, "Rejected call to unexposed method");
            return Err(CallError::Validation(format!(
                "Method not supported: {}",
                method
            )));
        };

        debug!(method = %method, params = params.len(), "Executing call");

        let future = match execute_guarded(|| operation(target, params)) {
            PanicGuardResult::Success(future) => future,
            PanicGuardResult::Panicked(msg) => {
                warn!(method = %method, panic_msg = %msg, "Operation panicked before running");
                return Err(CallError::Execution(LedgerError::Panicked(msg)));
            }
        };

        match execute_guarded_async(future).await {
            PanicGuardResult::Success(Ok(value)) => Ok(value),
            PanicGuardResult::Success(Err(err)) => {
                debug!(method = %method, error = %err, "Operation failed");
                Err(CallError::Execution(err))
            }
            PanicGuardResult::Panicked(msg) => {
                warn!(method = %method, panic_msg = %msg, "Operation panicked");
                Err(CallError::Execution(LedgerError::Panicked(msg)))
            }
        }
    }
}
