// Provider - composes Coordinator, Executor and a ledger
//
// The ledger never executes its own requests: every request becomes one
// coordinator task whose body asks the executor to run it.

use crate::application::coordinator::{Coordinator, CoordinatorStats, TaskHandle};
use crate::application::executor::Executor;
use crate::application::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{CallDescriptor, CallResult, ConcurrencyPolicy, CoordinatorError, Params};
use crate::port::{Ledger, ReadinessObserver, Request, RequestHandler};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Provider construction options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// `true`: requests run concurrently (limit 0). `false`: strictly one at a time (limit 1).
    pub async_request_processing: bool,
    /// Explicit limit; overrides `async_request_processing` when set
    pub concurrency_limit: Option<usize>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            async_request_processing: true,
            concurrency_limit: None,
        }
    }
}

impl ProviderOptions {
    pub fn concurrency_policy(&self) -> ConcurrencyPolicy {
        match self.concurrency_limit {
            Some(limit) => ConcurrencyPolicy::from_limit(limit),
            None => ConcurrencyPolicy::from_async_processing(self.async_request_processing),
        }
    }
}

/// Forwards the ledger's readiness into a single coordinator release.
///
/// May be fired from any thread, including a ledger's own init thread.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    coordinator: Coordinator,
}

impl ReadinessObserver for ReadySignal {
    fn on_ready(&self) {
        if self.coordinator.release() {
            info!("Ledger ready, dispatching queued requests");
        } else {
            debug!("Duplicate readiness signal ignored");
        }
    }
}

/// Request entry point in front of one ledger
pub struct Provider<L: Ledger> {
    ledger: Arc<L>,
    coordinator: Coordinator,
    executor: Arc<Executor<L>>,
}

impl<L: Ledger> Provider<L> {
    /// Build a provider whose coordinator stays held until the returned
    /// signal fires.
    ///
    /// # Errors
    /// - CoordinatorError::NoRuntime if called outside a tokio runtime
    pub fn new(
        options: &ProviderOptions,
        ledger: Arc<L>,
    ) -> Result<(Self, ReadySignal), CoordinatorError> {
        let policy = options.concurrency_policy();
        let coordinator = Coordinator::new(policy)?;
        let executor = Arc::new(Executor::new());

        info!(
            policy = %policy,
            methods = executor.methods().count(),
            "Provider created"
        );

        let ready = ReadySignal {
            coordinator: coordinator.clone(),
        };
        Ok((
            Self {
                ledger,
                coordinator,
                executor,
            },
            ready,
        ))
    }

    /// Build a provider and initialize the ledger in the background.
    ///
    /// Requests are accepted immediately and held until initialization
    /// succeeds. If it fails (or panics) the coordinator is disposed so that
    /// held requests settle with `CoordinatorError::Disposed`.
    ///
    /// # Errors
    /// - CoordinatorError::NoRuntime if called outside a tokio runtime
    pub fn initialize(
        options: &ProviderOptions,
        ledger: Arc<L>,
    ) -> Result<Self, CoordinatorError> {
        let (provider, ready) = Self::new(options, ledger)?;
        let ledger = Arc::clone(&provider.ledger);
        let coordinator = provider.coordinator.clone();

        tokio::spawn(async move {
            info!("Initializing ledger...");
            match execute_guarded_async(ledger.initialize()).await {
                PanicGuardResult::Success(Ok(())) => ready.on_ready(),
                PanicGuardResult::Success(Err(e)) => {
                    error!(error = %e, "Ledger initialization failed");
                    coordinator.dispose();
                }
                PanicGuardResult::Panicked(msg) => {
                    error!(panic_msg = %msg, "Ledger initialization panicked");
                    coordinator.dispose();
                }
            }
        });

        Ok(provider)
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Method names reachable through this provider
    pub fn exposed_methods(&self) -> Vec<&'static str> {
        self.executor.methods().collect()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    /// Submit a request against this provider's own ledger
    ///
    /// # Errors
    /// - CoordinatorError::Disposed after shutdown or failed initialization
    pub fn request(
        &self,
        method: impl Into<String>,
        params: Params,
    ) -> Result<TaskHandle<CallResult>, CoordinatorError> {
        self.handle(Request::new(Arc::clone(&self.ledger), method, params))
    }

    /// Stop accepting requests; running ones finish, held ones are rejected
    pub fn shutdown(&self) {
        self.coordinator.dispose();
    }
}

impl<L: Ledger> RequestHandler<L> for Provider<L> {
    fn handle(&self, request: Request<L>) -> Result<TaskHandle<CallResult>, CoordinatorError> {
        let executor = Arc::clone(&self.executor);
        let call = CallDescriptor::new(request.ledger, request.method, request.params);
        let handle = self
            .coordinator
            .submit(move || async move { executor.execute(call).await })?;

        debug!(sequence = handle.sequence(), "Request accepted");
        Ok(handle)
    }
}
