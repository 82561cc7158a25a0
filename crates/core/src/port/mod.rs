// Port Layer - Interfaces between the core and its collaborators

pub mod ledger;
pub mod readiness;
pub mod request_handler;

// Re-exports
pub use ledger::{parse_param, Ledger, MethodFn, MethodFuture, MethodRegistry};
pub use readiness::ReadinessObserver;
pub use request_handler::{Request, RequestHandler};
