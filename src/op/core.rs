// src/op/core.rs

//! The operation lifecycle core.
//!
//! An [`Operation`] is one stage of work: a typed input, a typed output,
//! a four-state lifecycle and a single-shot transform. Stages are linked
//! into chains by [`then`](Operation::then); completion of one stage
//! pushes its output into the next stage's input through an owned,
//! consume-on-fire completion hook.
//!
//! Locking discipline:
//! - `input` and `output` each sit behind their own mutex; reading one
//!   never blocks a writer of the other.
//! - `state` transitions are serialized behind a third mutex, so a lost
//!   cancel or a double finish cannot happen even when `start` and
//!   `cancel` race from different threads.
//! - The transform and the completion hook are `Option`s that are taken
//!   at the moment of invocation; they can never fire twice, and taking
//!   the hook releases the references it captured into the next stage.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::{OpError, Outcome};
use crate::op::state::OpState;
use crate::sched::{OpId, Schedulable, Scheduler};

/// Single-shot stage transform, consumed on first execution.
pub(crate) type Transform<I, O> = Box<dyn FnOnce(Outcome<I>) -> Outcome<O> + Send>;

/// Single-shot completion hook, consumed when the operation finishes.
pub type CompletionHook = Box<dyn FnOnce() + Send>;

type OutputObserver<O> = Box<dyn Fn(&Outcome<O>) + Send>;

/// One stage of typed, schedulable work.
///
/// Constructed through [`passthrough`](Operation::passthrough),
/// [`from_closure`](Operation::from_closure) or
/// [`with_input`](Operation::with_input), always behind an `Arc` so the
/// scheduler, the chain and observers can share it.
pub struct Operation<I: 'static, O: 'static> {
    id: OpId,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<OpState>,
    input: Mutex<Outcome<I>>,
    output: Mutex<Outcome<O>>,
    transform: Mutex<Option<Transform<I, O>>>,
    completed: Mutex<Option<CompletionHook>>,
    output_updated: Mutex<Option<OutputObserver<O>>>,
    dependencies: Mutex<Vec<Arc<dyn Schedulable>>>,
}

impl<I, O> Operation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    pub(crate) fn new(
        scheduler: Arc<dyn Scheduler>,
        input: Outcome<I>,
        transform: Transform<I, O>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: OpId::next(),
            scheduler,
            state: Mutex::new(OpState::Ready),
            input: Mutex::new(input),
            output: Mutex::new(Err(OpError::OutputNotSet)),
            transform: Mutex::new(Some(transform)),
            completed: Mutex::new(None),
            output_updated: Mutex::new(None),
            dependencies: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Current input outcome, by value.
    pub fn input(&self) -> Outcome<I> {
        self.input.lock().clone()
    }

    /// Replace the input outcome wholesale.
    pub fn set_input(&self, outcome: Outcome<I>) {
        *self.input.lock() = outcome;
    }

    /// Current output outcome, by value.
    pub fn output(&self) -> Outcome<O> {
        self.output.lock().clone()
    }

    /// Replace the output outcome wholesale and notify the output
    /// observer, if one is registered. The observer runs outside the
    /// field lock.
    pub fn set_output(&self, outcome: Outcome<O>) {
        let snapshot = self
            .output_updated
            .lock()
            .is_some()
            .then(|| outcome.clone());
        *self.output.lock() = outcome;
        if let Some(snapshot) = snapshot {
            if let Some(observer) = self.output_updated.lock().as_ref() {
                observer(&snapshot);
            }
        }
    }

    /// Register an observer invoked on every output write.
    pub fn on_output_updated(&self, observer: impl Fn(&Outcome<O>) + Send + 'static) {
        *self.output_updated.lock() = Some(Box::new(observer));
    }

    /// Install the completion hook. Fired at most once, from the finish
    /// path; installing a new hook replaces an unfired one.
    pub fn on_completed(&self, hook: impl FnOnce() + Send + 'static) {
        self.install_completion(Box::new(hook));
    }

    pub(crate) fn install_completion(&self, hook: CompletionHook) {
        *self.completed.lock() = Some(hook);
    }

    /// Declare a scheduling dependency. The scheduler will not start
    /// this operation before `dep` has finished.
    pub fn add_dependency(&self, dep: Arc<dyn Schedulable>) {
        self.dependencies.lock().push(dep);
    }

    pub fn dependencies(&self) -> Vec<Arc<dyn Schedulable>> {
        self.dependencies.lock().clone()
    }

    pub fn state(&self) -> OpState {
        *self.state.lock()
    }

    pub fn is_executing(&self) -> bool {
        self.state() == OpState::Executing
    }

    pub fn is_finished(&self) -> bool {
        self.state() == OpState::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == OpState::Cancelled
    }

    /// Ready to run: still `Ready` and every dependency has finished.
    pub fn is_ready(&self) -> bool {
        <Self as Schedulable>::is_ready(self)
    }

    /// Start transition. A cancelled operation finishes immediately
    /// (the completion hook still fires, so downstream stages and
    /// observers learn about it); otherwise the transform runs.
    pub fn start(&self) {
        if !self.can_proceed() {
            return;
        }
        self.execute();
    }

    /// Guard at the top of every execution path.
    ///
    /// Cancelled: drive the finish path and report false. Ready: claim
    /// the `Executing` state and report true. Anything else means the
    /// operation already ran; the start is ignored.
    pub fn can_proceed(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            OpState::Cancelled => {
                drop(state);
                self.finished();
                false
            }
            OpState::Ready => {
                *state = OpState::Executing;
                debug!(op = %self.id, "operation executing");
                true
            }
            current @ (OpState::Executing | OpState::Finished) => {
                drop(state);
                warn!(op = %self.id, state = %current, "start ignored; operation already ran");
                false
            }
        }
    }

    /// Finish transition: consume and fire the completion hook, then
    /// move to `Finished`. Taking the hook before firing makes a second
    /// finish a no-op for observers and drops the captured reference to
    /// the downstream stage.
    pub fn finished(&self) {
        let hook = self.completed.lock().take();
        let notified = hook.is_some();
        if let Some(hook) = hook {
            hook();
        }
        let from = {
            let mut state = self.state.lock();
            let from = *state;
            *state = OpState::Finished;
            from
        };
        debug!(op = %self.id, from = %from, notified, "operation finished");
    }

    /// Cancel transition, idempotent.
    ///
    /// The first cancel claims the `Cancelled` state and rewrites the
    /// output: a pending input becomes `Err(Cancelled)`, while an input
    /// that already holds a failure is preserved verbatim so the
    /// original error keeps flowing downstream. A second cancel changes
    /// nothing.
    pub fn cancel(&self) {
        let from = {
            let mut state = self.state.lock();
            if *state == OpState::Cancelled {
                debug!(op = %self.id, "cancel ignored; already cancelled");
                return;
            }
            let from = *state;
            *state = OpState::Cancelled;
            from
        };
        debug!(op = %self.id, from = %from, "operation cancelled");
        let output: Outcome<O> = self.input().and_then(|_| Err(OpError::Cancelled));
        self.set_output(output);
    }

    /// Run the transform against the current input and finish.
    ///
    /// A non-sentinel input failure skips the transform entirely and
    /// flows through unchanged; only a success or the root
    /// `FirstInputNotSet` marker reaches the transform.
    fn execute(&self) {
        let input = self.input();
        let transform = self.transform.lock().take();
        let output = match input {
            Err(err) if !err.is_first_input_marker() => {
                debug!(op = %self.id, error = %err, "upstream failure; transform skipped");
                Err(err)
            }
            outcome => match transform {
                Some(transform) => transform(outcome),
                None => {
                    warn!(op = %self.id, "transform already consumed");
                    Err(OpError::OutputNotSet)
                }
            },
        };
        self.set_output(output);
        self.finished();
    }
}

impl<T> Operation<T, T>
where
    T: Clone + Send + 'static,
{
    /// A no-op stage: its output is whatever its input holds when it
    /// runs. Only constructible when input and output types coincide,
    /// which is what makes the pass-through statically checked.
    pub fn passthrough(scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
        Self::new(scheduler, Err(OpError::InputNotSet), Box::new(|outcome| outcome))
    }
}

impl<I, O> Schedulable for Operation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    fn id(&self) -> OpId {
        self.id
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        Operation::scheduler(self)
    }

    fn state(&self) -> OpState {
        Operation::state(self)
    }

    fn dependencies(&self) -> Vec<Arc<dyn Schedulable>> {
        Operation::dependencies(self)
    }

    fn run(&self) {
        self.start();
    }

    fn cancel(&self) {
        Operation::cancel(self);
    }
}
