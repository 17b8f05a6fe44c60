// src/sched/backend.rs

//! Pluggable scheduler abstraction.
//!
//! Operations talk to a [`Scheduler`] instead of a concrete work queue.
//! This keeps the lifecycle core free of runtime concerns and makes it
//! easy to swap in a synchronous scheduler in tests while the production
//! implementation lives in [`queue`](crate::sched::queue).
//!
//! [`Schedulable`] is the type-erased view of an operation the scheduler
//! consumes: identity, state, dependency set, and the run/cancel entry
//! points. Dependency readiness is derived from it, so a scheduler never
//! needs to understand operation payload types.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::op::OpState;

/// A plain unit of work with no dependency tracking (used for
/// notification contexts).
pub type Job = Box<dyn FnOnce() + Send>;

/// Process-unique operation identifier.
///
/// Used by schedulers to deduplicate submissions and by log events to
/// correlate lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(u64);

impl OpId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        OpId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-erased view of an operation, as consumed by a [`Scheduler`].
pub trait Schedulable: Send + Sync {
    fn id(&self) -> OpId;

    /// The scheduler this operation wants to run on.
    fn scheduler(&self) -> Arc<dyn Scheduler>;

    fn state(&self) -> OpState;

    /// Direct dependencies; the scheduler must not run this operation
    /// before every one of them has finished.
    fn dependencies(&self) -> Vec<Arc<dyn Schedulable>>;

    /// Drive the operation through its start path. Runs the transform,
    /// or finishes immediately if the operation was cancelled.
    fn run(&self);

    fn cancel(&self);

    /// Ready to run: still `Ready`, and every dependency has finished.
    fn is_ready(&self) -> bool {
        self.state() == OpState::Ready
            && self
                .dependencies()
                .iter()
                .all(|dep| dep.state() == OpState::Finished)
    }

    /// Cascading cancel: a cancelled operation makes every ancestor
    /// feeding it useless work, so ancestors are cancelled first.
    fn cancel_with_dependencies(&self) {
        for dep in self.dependencies() {
            dep.cancel_with_dependencies();
        }
        self.cancel();
    }
}

/// Work-queue capability operations are scheduled on.
///
/// Implementations must not run a submitted operation before its
/// dependency set has finished; beyond that they are free to choose
/// threads and ordering. The production implementation is
/// [`PoolScheduler`](crate::sched::PoolScheduler); tests can substitute
/// their own.
pub trait Scheduler: Send + Sync {
    /// Admit one operation for execution once its dependencies allow.
    fn submit(&self, op: Arc<dyn Schedulable>);

    /// Run a plain job with no dependency tracking.
    fn run_detached(&self, job: Job);
}
