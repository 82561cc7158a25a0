// Concurrency Policy Domain Model

use super::error::CoordinatorError;
use std::fmt;
use std::num::NonZeroUsize;

/// Arrival sequence number assigned by the coordinator at submit time
pub type Sequence = u64;

/// How many submitted tasks may run at once.
///
/// Expressed as an integer limit this is `0` for [`Unbounded`], `1` for
/// strict serialization and `N > 1` for a bounded pool.
///
/// [`Unbounded`]: ConcurrencyPolicy::Unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcurrencyPolicy {
    /// No admission gating: every task starts as soon as it is eligible
    Unbounded,
    /// At most N tasks in flight, admitted in arrival order
    Bounded(NonZeroUsize),
}

impl ConcurrencyPolicy {
    /// Strict single-flight: task k+1 never starts before task k settles
    pub const SERIAL: Self = Self::Bounded(NonZeroUsize::MIN);

    /// Build from a non-negative limit (`0` = unbounded)
    pub fn from_limit(limit: usize) -> Self {
        match NonZeroUsize::new(limit) {
            Some(n) => Self::Bounded(n),
            None => Self::Unbounded,
        }
    }

    /// Map the provider's boolean switch onto a policy
    pub fn from_async_processing(async_request_processing: bool) -> Self {
        if async_request_processing {
            Self::Unbounded
        } else {
            Self::SERIAL
        }
    }

    /// Integer form of the policy (`0` = unbounded)
    pub fn limit(&self) -> usize {
        match self {
            Self::Unbounded => 0,
            Self::Bounded(n) => n.get(),
        }
    }

    /// Whether another task may start given the current in-flight count
    pub fn has_capacity(&self, in_flight: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(n) => in_flight < n.get(),
        }
    }

    pub fn is_serial(&self) -> bool {
        *self == Self::SERIAL
    }
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self::Unbounded
    }
}

impl TryFrom<i64> for ConcurrencyPolicy {
    type Error = CoordinatorError;

    fn try_from(limit: i64) -> Result<Self, Self::Error> {
        let limit = usize::try_from(limit).map_err(|_| CoordinatorError::InvalidLimit(limit))?;
        Ok(Self::from_limit(limit))
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Bounded(n) if n.get() == 1 => write!(f, "serial"),
            Self::Bounded(n) => write!(f, "bounded({})", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_limit_rejected() {
        let result = ConcurrencyPolicy::try_from(-1);
        assert_eq!(result, Err(CoordinatorError::InvalidLimit(-1)));
    }

    #[test]
    fn test_limit_mapping() {
        assert_eq!(ConcurrencyPolicy::try_from(0), Ok(ConcurrencyPolicy::Unbounded));
        assert_eq!(ConcurrencyPolicy::try_from(1), Ok(ConcurrencyPolicy::SERIAL));
        assert_eq!(ConcurrencyPolicy::from_limit(4).limit(), 4);
        assert_eq!(ConcurrencyPolicy::Unbounded.limit(), 0);
    }

    #[test]
    fn test_async_processing_switch() {
        assert_eq!(
            ConcurrencyPolicy::from_async_processing(true),
            ConcurrencyPolicy::Unbounded
        );
        assert!(ConcurrencyPolicy::from_async_processing(false).is_serial());
    }

    #[test]
    fn test_capacity() {
        let pool = ConcurrencyPolicy::from_limit(2);
        assert!(pool.has_capacity(0));
        assert!(pool.has_capacity(1));
        assert!(!pool.has_capacity(2));
        assert!(ConcurrencyPolicy::Unbounded.has_capacity(usize::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(ConcurrencyPolicy::Unbounded.to_string(), "unbounded");
        assert_eq!(ConcurrencyPolicy::SERIAL.to_string(), "serial");
        assert_eq!(ConcurrencyPolicy::from_limit(3).to_string(), "bounded(3)");
    }
}
