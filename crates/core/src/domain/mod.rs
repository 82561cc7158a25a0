// Domain Layer - Pure scheduling and call models

pub mod call;
pub mod error;
pub mod policy;

// Re-exports
pub use call::{CallDescriptor, CallError, CallErrorKind, CallResult, Params};
pub use error::{CoordinatorError, LedgerError};
pub use policy::{ConcurrencyPolicy, Sequence};
