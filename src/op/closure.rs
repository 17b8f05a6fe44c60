// src/op/closure.rs

//! Closure-backed operation constructors.
//!
//! These are the concrete stages callers actually build: the transform
//! is supplied as a closure at construction time, optionally pre-seeded
//! with an input value.
//!
//! The closure receives the full input [`Outcome`], not just a success
//! value. For a root stage that nobody feeds, that outcome is the
//! `FirstInputNotSet` marker and the closure still runs (a root decides
//! its own fate). Any other failure in the input means a real upstream
//! stage failed; the closure is then never invoked and the failure flows
//! through unchanged (see `Operation::execute`).

use std::sync::Arc;

use crate::errors::{OpError, Outcome};
use crate::op::core::Operation;
use crate::sched::Scheduler;

impl<I, O> Operation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    /// A root stage with no seeded input. The closure runs with the
    /// `FirstInputNotSet` marker unless an upstream stage is chained in
    /// front of it later.
    pub fn from_closure(
        scheduler: Arc<dyn Scheduler>,
        closure: impl FnOnce(Outcome<I>) -> Outcome<O> + Send + 'static,
    ) -> Arc<Self> {
        Self::new(scheduler, Err(OpError::FirstInputNotSet), Box::new(closure))
    }

    /// A stage pre-seeded with an input value; the closure runs with
    /// `Ok(value)`.
    pub fn with_input(
        scheduler: Arc<dyn Scheduler>,
        value: I,
        closure: impl FnOnce(Outcome<I>) -> Outcome<O> + Send + 'static,
    ) -> Arc<Self> {
        Self::new(scheduler, Ok(value), Box::new(closure))
    }
}
