// Application Layer - Scheduling and dispatch use cases

pub mod coordinator;
pub mod executor;
pub mod panic_guard;
pub mod provider;

// Re-exports
pub use coordinator::{Coordinator, CoordinatorStats, TaskHandle};
pub use executor::Executor;
pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};
pub use provider::{Provider, ProviderOptions, ReadySignal};
