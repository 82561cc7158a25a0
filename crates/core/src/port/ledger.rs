// Ledger Port - the method-bearing backend requests are dispatched to
//
// A ledger never handles its own requests. It only declares which of its
// operations are reachable from outside, and the Executor is the sole caller.

use crate::domain::{LedgerError, Params};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by an exposed operation
pub type MethodFuture = BoxFuture<'static, Result<Value, LedgerError>>;

/// Type-erased exposed operation
pub type MethodFn<L> = Arc<dyn Fn(Arc<L>, Params) -> MethodFuture + Send + Sync>;

/// Explicit allow-list of operations callable on a ledger of type `L`
pub struct MethodRegistry<L> {
    methods: BTreeMap<&'static str, MethodFn<L>>,
}

impl<L> MethodRegistry<L> {
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Expose an operation under `name`.
    ///
    /// Registering the same name twice replaces the earlier operation.
    pub fn register<F, Fut>(&mut self, name: &'static str, operation: F) -> &mut Self
    where
        L: 'static,
        F: Fn(Arc<L>, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, LedgerError>> + Send + 'static,
    {
        let erased: MethodFn<L> =
            Arc::new(move |ledger: Arc<L>, params: Params| -> MethodFuture {
                Box::pin(operation(ledger, params))
            });
        self.methods.insert(name, erased);
        self
    }

    pub fn get(&self, name: &str) -> Option<&MethodFn<L>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Exposed method names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<L> Default for MethodRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for MethodRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

/// Ledger backend trait
///
/// Implementations:
/// - DevLedger (daemon): in-memory development chain
/// - MockLedger: scripted behaviors for tests
#[async_trait]
pub trait Ledger: Send + Sync + Sized + 'static {
    /// Declare the operations reachable from the request surface
    fn expose(methods: &mut MethodRegistry<Self>);

    /// Bring the backend to a state where it can serve requests.
    ///
    /// The provider releases its coordinator once this returns `Ok`.
    async fn initialize(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Deserialize the positional parameter at `index`.
///
/// A missing parameter is treated as JSON `null`, so `Option<T>` parameters
/// may be omitted.
pub fn parse_param<T: DeserializeOwned>(
    params: &[Value],
    index: usize,
    name: &str,
) -> Result<T, LedgerError> {
    let value = params.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        LedgerError::InvalidParams(format!("param {} ({}): {}", index, name, e))
    })
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock ledger recording every operation it runs.
    ///
    /// Exposed operations:
    /// - `echo [..]`: returns its params
    /// - `sleep [ms, tag?]`: waits `ms` then returns `tag` (or `ms`)
    /// - `fail [msg]`: returns `LedgerError::Failed(msg)`
    /// - `panic`: panics while being polled
    /// - `sync_panic`: panics before producing a future
    /// - `ready`: fails with `NotInitialized` until `initialize` ran
    ///
    /// `reset` is a public method that is deliberately *not* exposed.
    pub struct MockLedger {
        calls: Mutex<Vec<String>>,
        initialized: AtomicBool,
        init_delay: Option<Duration>,
        init_failure: Option<String>,
    }

    impl MockLedger {
        pub fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                initialized: AtomicBool::new(false),
                init_delay: None,
                init_failure: None,
            }
        }

        pub fn with_init_delay(mut self, delay: Duration) -> Self {
            self.init_delay = Some(delay);
            self
        }

        pub fn with_init_failure(mut self, message: impl Into<String>) -> Self {
            self.init_failure = Some(message.into());
            self
        }

        /// Operations invoked so far, in invocation order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn is_initialized(&self) -> bool {
            self.initialized.load(Ordering::SeqCst)
        }

        /// Internal operation not reachable through the executor
        pub fn reset(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        async fn echo(&self, params: Params) -> Result<Value, LedgerError> {
            self.record("echo");
            Ok(Value::Array(params))
        }

        async fn sleep(&self, params: Params) -> Result<Value, LedgerError> {
            let ms: u64 = parse_param(&params, 0, "ms")?;
            let tag: Option<Value> = parse_param(&params, 1, "tag")?;
            self.record(format!("sleep:{}", ms));
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(tag.unwrap_or_else(|| Value::from(ms)))
        }

        async fn fail(&self, params: Params) -> Result<Value, LedgerError> {
            let message: String = parse_param(&params, 0, "message")?;
            self.record("fail");
            Err(LedgerError::Failed(message))
        }

        async fn panic_when_polled(&self) -> Result<Value, LedgerError> {
            self.record("panic");
            tokio::task::yield_now().await;
            panic!("mock ledger panicked while polled")
        }

        fn panic_before_future(&self) -> futures::future::Ready<Result<Value, LedgerError>> {
            panic!("mock ledger panicked before returning a future")
        }

        async fn ready(&self) -> Result<Value, LedgerError> {
            if !self.is_initialized() {
                return Err(LedgerError::NotInitialized("mock ledger".to_string()));
            }
            self.record("ready");
            Ok(Value::Bool(true))
        }
    }

    impl Default for MockLedger {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Ledger for MockLedger {
        fn expose(methods: &mut MethodRegistry<Self>) {
            methods
                .register("echo", |ledger, params| async move { ledger.echo(params).await })
                .register("sleep", |ledger, params| async move { ledger.sleep(params).await })
                .register("fail", |ledger, params| async move { ledger.fail(params).await })
                .register("panic", |ledger, _params| async move {
                    ledger.panic_when_polled().await
                })
                .register("sync_panic", |ledger, _params| ledger.panic_before_future())
                .register("ready", |ledger, _params| async move { ledger.ready().await });
        }

        async fn initialize(&self) -> Result<(), LedgerError> {
            if let Some(delay) = self.init_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.init_failure {
                return Err(LedgerError::Failed(message.clone()));
            }
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockLedger;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_lists_exposed_methods_only() {
        let mut methods = MethodRegistry::<MockLedger>::new();
        MockLedger::expose(&mut methods);

        let names: Vec<_> = methods.names().collect();
        assert_eq!(
            names,
            vec!["echo", "fail", "panic", "ready", "sleep", "sync_panic"]
        );
        assert!(!methods.contains("reset"));
        assert!(methods.get("reset").is_none());
    }

    #[test]
    fn test_parse_param() {
        let params = vec![json!(42), json!("tag")];
        let ms: u64 = parse_param(&params, 0, "ms").unwrap();
        assert_eq!(ms, 42);

        let missing: Option<String> = parse_param(&params, 5, "extra").unwrap();
        assert!(missing.is_none());

        let err = parse_param::<u64>(&params, 1, "ms").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidParams(msg) if msg.contains("param 1 (ms)")));
    }

    #[tokio::test]
    async fn test_registered_operation_runs() {
        let mut methods = MethodRegistry::<MockLedger>::new();
        MockLedger::expose(&mut methods);
        let ledger = Arc::new(MockLedger::new());

        let echo = methods.get("echo").unwrap();
        let value = echo(ledger.clone(), vec![json!(1), json!("a")]).await.unwrap();

        assert_eq!(value, json!([1, "a"]));
        assert_eq!(ledger.calls(), vec!["echo"]);
    }
}
