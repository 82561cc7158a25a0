// Panic isolation for task bodies and ledger operations
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed (its own output may still be an error)
    Success(T),
    /// Execution panicked
    Panicked(String),
}

impl<T> PanicGuardResult<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Panicked(msg) => Err(msg),
        }
    }
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as
/// `PanicGuardResult::Panicked`. Callers must not rely on state the closure
/// may have left half-updated.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            debug!(panic_msg = %panic_msg, "Guarded call panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Drive a future to completion with panic isolation
///
/// A panic raised from any `poll` of `future` is caught and reported as
/// `PanicGuardResult::Panicked`.
///
/// # Example
/// ```text
/// let result = execute_guarded_async(async {
///     tokio::time::sleep(std::time::Duration::from_millis(10)).await;
///     42
/// }).await;
/// ```
pub async fn execute_guarded_async<F>(future: F) -> PanicGuardResult<F::Output>
where
    F: Future,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            debug!(panic_msg = %panic_msg, "Guarded future panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
