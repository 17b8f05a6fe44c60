// src/op/chain.rs

//! Chain building.
//!
//! [`then`](Operation::then) records a dependency edge plus the data
//! wiring: when the predecessor finishes, its output (success or failure
//! alike) is copied into the successor's input. Failures therefore
//! propagate down a chain without any branching at the call site.
//!
//! [`after`](Operation::after) records a scheduling-only edge with no
//! data flow, for sequencing stages whose types are unrelated.
//!
//! Neither method executes anything; submission happens separately via
//! [`submit_chain`](crate::sched::submit_chain).

use std::sync::Arc;

use crate::op::core::Operation;
use crate::sched::Schedulable;

impl<I, O> Operation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Chain `next` after this operation and return it, so calls compose
    /// left to right: `a.then(b).then(c)`.
    ///
    /// The completion hook holds this operation weakly and `next`
    /// strongly; the strong edge back from `next`'s dependency list
    /// would otherwise form a cycle, which is broken the moment the hook
    /// is consumed by the finish path.
    pub fn then<U>(self: Arc<Self>, next: Arc<Operation<O, U>>) -> Arc<Operation<O, U>>
    where
        U: Clone + Send + 'static,
    {
        next.add_dependency(self.clone());
        let upstream = Arc::downgrade(&self);
        let downstream = Arc::clone(&next);
        self.on_completed(move || {
            if let Some(op) = upstream.upgrade() {
                downstream.set_input(op.output());
            }
        });
        next
    }

    /// Sequence this operation after `prior` without wiring any data
    /// between them.
    pub fn after(self: Arc<Self>, prior: Arc<dyn Schedulable>) -> Arc<Self> {
        self.add_dependency(prior);
        self
    }
}
