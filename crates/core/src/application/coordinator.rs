// Request Coordinator - admission and ordering gate
//
// All scheduling state lives behind one mutex. Every mutation (enqueue,
// start, settle, release, dispose) is a single critical section with no
// `.await` and no user code inside it; task bodies only ever run on tasks
// spawned through the coordinator's runtime handle, outside the lock.

use crate::application::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{ConcurrencyPolicy, CoordinatorError, Sequence};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

/// Type-erased task body. Gives its slot back, then settles its completion
/// handle.
type Job = Box<dyn FnOnce(Slot) -> BoxFuture<'static, ()> + Send>;

struct Pending {
    sequence: Sequence,
    job: Job,
}

struct State {
    policy: ConcurrencyPolicy,
    backlog: VecDeque<Pending>,
    in_flight: usize,
    held: bool,
    disposed: bool,
    next_sequence: Sequence,
}

impl State {
    /// Pop every leading backlog entry that may start now, reserving its slot
    fn take_startable(&mut self) -> Vec<Pending> {
        let mut ready = Vec::new();
        if self.held || self.disposed {
            return ready;
        }
        while self.policy.has_capacity(self.in_flight) {
            match self.backlog.pop_front() {
                Some(pending) => {
                    self.in_flight += 1;
                    ready.push(pending);
                }
                None => break,
            }
        }
        ready
    }

    fn can_start_immediately(&self) -> bool {
        !self.held
            && !self.disposed
            && self.backlog.is_empty()
            && self.policy.has_capacity(self.in_flight)
    }
}

/// Read-only snapshot of coordinator bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub policy: ConcurrencyPolicy,
    pub held: bool,
    pub disposed: bool,
    pub in_flight: usize,
    pub pending: usize,
    /// Total tasks accepted so far (equals the next sequence number)
    pub submitted: u64,
}

/// Admission gate for deferred work.
///
/// Starts *held*: submitted tasks are buffered until [`release`] is called
/// once. After that, tasks start according to the [`ConcurrencyPolicy`]:
/// unbounded, strictly serialized, or a FIFO-admitted pool of N.
///
/// Tasks are spawned on the runtime captured at construction, so
/// [`submit`], [`release`] and [`dispose`] may be called from any thread.
/// Cloning is cheap and every clone drives the same queue.
///
/// [`release`]: Coordinator::release
/// [`submit`]: Coordinator::submit
/// [`dispose`]: Coordinator::dispose
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<Mutex<State>>,
    runtime: Handle,
}

impl Coordinator {
    /// Create a held coordinator bound to the current tokio runtime
    ///
    /// # Errors
    /// - CoordinatorError::NoRuntime if called outside a tokio runtime
    pub fn new(policy: ConcurrencyPolicy) -> Result<Self, CoordinatorError> {
        let runtime = Handle::try_current().map_err(|_| CoordinatorError::NoRuntime)?;
        Ok(Self::with_runtime(policy, runtime))
    }

    /// Create a held coordinator whose tasks run on `runtime`
    pub fn with_runtime(policy: ConcurrencyPolicy, runtime: Handle) -> Self {
        debug!(policy = %policy, "Creating request coordinator");
        Self {
            state: Arc::new(Mutex::new(State {
                policy,
                backlog: VecDeque::new(),
                in_flight: 0,
                held: true,
                disposed: false,
                next_sequence: 0,
            })),
            runtime,
        }
    }

    /// Create a held coordinator from an integer limit (`0` = unbounded)
    ///
    /// # Errors
    /// - CoordinatorError::InvalidLimit if `limit` is negative
    /// - CoordinatorError::NoRuntime if called outside a tokio runtime
    pub fn with_limit(limit: i64) -> Result<Self, CoordinatorError> {
        Self::new(ConcurrencyPolicy::try_from(limit)?)
    }

    pub fn policy(&self) -> ConcurrencyPolicy {
        self.lock().policy
    }

    /// Accept a unit of work and return a handle to its outcome.
    ///
    /// `factory` is invoked only when the task starts. Its output is passed
    /// through untouched, so a task that returns `Err` settles its handle
    /// with `Ok(Err(..))`; only coordinator-level conditions surface as the
    /// outer error.
    ///
    /// # Errors
    /// - CoordinatorError::Disposed if the coordinator was disposed
    pub fn submit<F, Fut>(&self, factory: F) -> Result<TaskHandle<Fut::Output>, CoordinatorError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |slot: Slot| {
            async move {
                let settled = match execute_guarded_async(async move { factory().await }).await {
                    PanicGuardResult::Success(output) => Ok(output),
                    PanicGuardResult::Panicked(msg) => {
                        warn!(sequence = slot.sequence, panic_msg = %msg, "Task panicked");
                        Err(CoordinatorError::TaskPanicked(msg))
                    }
                };
                // Slot is free before the caller observes the outcome
                drop(slot);
                // Receiver is gone if the caller stopped waiting
                let _ = tx.send(settled);
            }
            .boxed()
        });

        let (sequence, immediate) = {
            let mut state = self.lock();
            if state.disposed {
                return Err(CoordinatorError::Disposed);
            }
            let sequence = state.next_sequence;
            state.next_sequence += 1;

            if state.can_start_immediately() {
                state.in_flight += 1;
                (sequence, Some(Pending { sequence, job }))
            } else {
                state.backlog.push_back(Pending { sequence, job });
                trace!(
                    sequence,
                    held = state.held,
                    in_flight = state.in_flight,
                    pending = state.backlog.len(),
                    "Task queued"
                );
                (sequence, None)
            }
        };

        if let Some(pending) = immediate {
            self.start(pending);
        }

        Ok(TaskHandle { sequence, rx })
    }

    /// Leave the held state and start as much of the backlog as the policy allows.
    ///
    /// Returns `true` for the call that actually released; later calls are
    /// no-ops returning `false`. May be called from threads outside the
    /// runtime.
    pub fn release(&self) -> bool {
        let ready = {
            let mut state = self.lock();
            if !state.held {
                return false;
            }
            state.held = false;
            info!(
                policy = %state.policy,
                pending = state.backlog.len(),
                "Coordinator released"
            );
            state.take_startable()
        };

        for pending in ready {
            self.start(pending);
        }
        true
    }

    pub fn is_held(&self) -> bool {
        self.lock().held
    }

    /// Permanently stop accepting work.
    ///
    /// Backlog entries are dropped and their handles settle with
    /// `CoordinatorError::Disposed`. Tasks already running finish normally.
    pub fn dispose(&self) {
        let dropped: Vec<Pending> = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.backlog.drain(..).collect()
        };

        info!(dropped = dropped.len(), "Coordinator disposed");
        // Dropping the jobs drops their senders, outside the lock
        drop(dropped);
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    pub fn stats(&self) -> CoordinatorStats {
        let state = self.lock();
        CoordinatorStats {
            policy: state.policy,
            held: state.held,
            disposed: state.disposed,
            in_flight: state.in_flight,
            pending: state.backlog.len(),
            submitted: state.next_sequence,
        }
    }

    /// The lock is never held across user code, so a poisoned guard still
    /// holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a task whose slot has already been reserved
    fn start(&self, pending: Pending) {
        let Pending { sequence, job } = pending;
        debug!(sequence, "Starting task");

        let slot = Slot {
            coordinator: self.clone(),
            sequence,
        };
        self.runtime.spawn(job(slot));
    }

    /// Free the settled task's slot and admit the next backlog entries
    fn settle(&self, sequence: Sequence) {
        let ready = {
            let mut state = self.lock();
            state.in_flight -= 1;
            trace!(
                sequence,
                in_flight = state.in_flight,
                pending = state.backlog.len(),
                "Task settled"
            );
            state.take_startable()
        };

        for pending in ready {
            self.start(pending);
        }
    }
}

/// A reserved in-flight slot. Dropping it settles the slot, whether the task
/// finished or its future was dropped by a shutting-down runtime.
struct Slot {
    coordinator: Coordinator,
    sequence: Sequence,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.coordinator.settle(self.sequence);
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Write-once completion handle for a submitted task.
///
/// Resolves to the task's own output, or to a `CoordinatorError` if the task
/// panicked or was dropped by disposal.
#[must_use = "a task handle does nothing unless awaited"]
#[derive(Debug)]
pub struct TaskHandle<T> {
    sequence: Sequence,
    rx: oneshot::Receiver<Result<T, CoordinatorError>>,
}

impl<T> TaskHandle<T> {
    /// Arrival sequence number assigned at submit
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, CoordinatorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(CoordinatorError::Disposed)))
    }
}
