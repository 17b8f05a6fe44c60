// src/usecase.rs

//! Outcome observation over a chain.
//!
//! A [`UseCase`] wraps the terminal operation of a chain and turns its
//! completion into success/error/always callbacks, dispatched on a
//! caller-chosen notification scheduler. The observer is installed as
//! the terminal's single-shot completion hook, so exactly one of the
//! success/error branches fires per completion no matter how the finish
//! was reached (normal run, cancelled run, or a manual
//! [`propagate`](UseCase::propagate)).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::{OpError, Outcome};
use crate::op::core::{CompletionHook, Operation};
use crate::op::state::OpState;
use crate::sched::{Schedulable, Scheduler, submit_chain};

/// Typed-output view of a schedulable operation, as observed by a
/// [`UseCase`]. Implemented by [`Operation<I, O>`] for its output type.
pub trait Produces<T>: Schedulable {
    /// The operation's current output outcome, by value.
    fn outcome(&self) -> Outcome<T>;

    /// Overwrite the operation's output outcome.
    fn set_outcome(&self, outcome: Outcome<T>);

    /// Install the operation's single-shot completion hook.
    fn set_completion_hook(&self, hook: CompletionHook);

    /// Drive the operation through its finish path.
    fn finished(&self);

    /// Type-erase to the scheduler-facing view.
    fn as_schedulable(self: Arc<Self>) -> Arc<dyn Schedulable>;
}

impl<I, O> Produces<O> for Operation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    fn outcome(&self) -> Outcome<O> {
        self.output()
    }

    fn set_outcome(&self, outcome: Outcome<O>) {
        self.set_output(outcome);
    }

    fn set_completion_hook(&self, hook: CompletionHook) {
        self.install_completion(hook);
    }

    fn finished(&self) {
        Operation::finished(self);
    }

    fn as_schedulable(self: Arc<Self>) -> Arc<dyn Schedulable> {
        self
    }
}

struct CallbackSet<T: 'static> {
    success: Mutex<Vec<Box<dyn Fn(&T) + Send>>>,
    error: Mutex<Vec<Box<dyn Fn(&OpError) + Send>>>,
    always: Mutex<Vec<Box<dyn Fn() + Send>>>,
}

impl<T: 'static> CallbackSet<T> {
    fn new() -> Self {
        Self {
            success: Mutex::new(Vec::new()),
            error: Mutex::new(Vec::new()),
            always: Mutex::new(Vec::new()),
        }
    }

    /// Invoke the matching branch for the outcome, in registration
    /// order, then every always callback. Called at most once per
    /// completion because the feeding hook is single-shot.
    fn dispatch(&self, outcome: &Outcome<T>) {
        match outcome {
            Ok(value) => {
                let callbacks = self.success.lock();
                debug!(count = callbacks.len(), "dispatching success callbacks");
                for callback in callbacks.iter() {
                    callback(value);
                }
            }
            Err(error) => {
                let callbacks = self.error.lock();
                debug!(count = callbacks.len(), error = %error, "dispatching error callbacks");
                for callback in callbacks.iter() {
                    callback(error);
                }
            }
        }
        for callback in self.always.lock().iter() {
            callback();
        }
    }
}

/// Outcome-observation wrapper around a chain.
///
/// Created empty, configured with
/// [`prepare_execution`](UseCase::prepare_execution), then driven with
/// [`perform`](UseCase::perform). Callback registration composes
/// fluently and works before or after `perform`.
pub struct UseCase<T: 'static> {
    terminal: Mutex<Option<Arc<dyn Produces<T>>>>,
    callbacks: Arc<CallbackSet<T>>,
    performed: AtomicBool,
}

impl<T> UseCase<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            terminal: Mutex::new(None),
            callbacks: Arc::new(CallbackSet::new()),
            performed: AtomicBool::new(false),
        }
    }

    /// Store the chain's terminal operation and install the completion
    /// observer. Callbacks will be dispatched on `notify`, which the
    /// observer captures.
    ///
    /// Installing the observer here, not in `perform`, is what lets
    /// [`propagate`](UseCase::propagate) notify subscribers without the
    /// chain ever being submitted.
    pub fn prepare_execution(&self, operation: Arc<dyn Produces<T>>, notify: Arc<dyn Scheduler>) {
        if self.terminal.lock().is_some() {
            warn!("prepare_execution called again; replacing terminal operation");
        }

        let callbacks = Arc::clone(&self.callbacks);
        let observed = Arc::downgrade(&operation);
        operation.set_completion_hook(Box::new(move || {
            let Some(op) = observed.upgrade() else {
                return;
            };
            let outcome = op.outcome();
            let callbacks = Arc::clone(&callbacks);
            notify.run_detached(Box::new(move || callbacks.dispatch(&outcome)));
        }));

        *self.terminal.lock() = Some(operation);
    }

    /// Register a success callback; all registered callbacks fire, in
    /// registration order, with the terminal success value.
    pub fn success(&self, callback: impl Fn(&T) + Send + 'static) -> &Self {
        self.callbacks.success.lock().push(Box::new(callback));
        self
    }

    /// Register an error callback; fires with the terminal failure.
    pub fn error(&self, callback: impl Fn(&OpError) + Send + 'static) -> &Self {
        self.callbacks.error.lock().push(Box::new(callback));
        self
    }

    /// Register a callback that fires after either branch, exactly once
    /// per completion.
    pub fn always(&self, callback: impl Fn() + Send + 'static) -> &Self {
        self.callbacks.always.lock().push(Box::new(callback));
        self
    }

    /// Submit the whole chain, dependencies first. A second call is
    /// ignored.
    pub fn perform(&self) {
        let terminal = self.terminal.lock().clone();
        let Some(terminal) = terminal else {
            warn!("perform called before prepare_execution; ignoring");
            return;
        };
        if self.performed.swap(true, Ordering::SeqCst) {
            warn!("perform called twice; ignoring");
            return;
        }
        submit_chain(&terminal.as_schedulable());
    }

    /// Manual short-circuit: overwrite the terminal output with the
    /// given error and drive the finish path, so error/always callbacks
    /// fire without the chain running.
    pub fn propagate(&self, error: OpError) {
        let terminal = self.terminal.lock().clone();
        let Some(terminal) = terminal else {
            warn!("propagate called before prepare_execution; ignoring");
            return;
        };
        debug!(error = %error, "propagating error to terminal operation");
        terminal.set_outcome(Err(error));
        terminal.finished();
    }

    /// Whether the terminal operation is currently executing.
    pub fn is_executing(&self) -> bool {
        self.terminal
            .lock()
            .as_ref()
            .map(|op| op.state() == OpState::Executing)
            .unwrap_or(false)
    }

    /// Cascading cancel of the terminal operation and every transitive
    /// dependency feeding it.
    pub fn cancel_all_operations(&self) {
        if let Some(terminal) = self.terminal.lock().as_ref() {
            debug!(op = %terminal.id(), "cancelling chain");
            terminal.cancel_with_dependencies();
        }
    }
}

impl<T> Default for UseCase<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
