use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use opchain::{OpError, Operation, Outcome, Scheduler};
use opchain_test_utils::{InlineScheduler, init_tracing};

fn scheduler() -> Arc<dyn Scheduler> {
    InlineScheduler::new()
}

#[test]
fn ready_state_tracks_dependencies() {
    init_tracing();
    let sched = scheduler();

    let dependency = Operation::<String, String>::passthrough(sched.clone());
    let op = Operation::<String, String>::passthrough(sched.clone());
    assert!(op.is_ready());

    let op = op.after(dependency.clone());
    assert!(!op.is_ready());

    dependency.start();
    assert!(op.is_ready());
}

#[test]
fn can_proceed_claims_executing_state() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());

    assert!(!op.is_executing());
    assert!(op.can_proceed());
    assert!(op.is_executing());
}

#[test]
fn can_proceed_after_cancel_finishes_instead() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());

    assert!(op.can_proceed());
    op.cancel();

    assert!(!op.can_proceed());
    assert!(!op.is_executing());
    assert!(op.is_finished());
}

#[test]
fn finished_fires_completion_hook_once() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());

    let fired = Arc::new(AtomicUsize::new(0));
    op.on_completed({
        let fired = Arc::clone(&fired);
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    assert!(!op.is_finished());
    op.finished();
    assert!(op.is_finished());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    op.finished();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn cancel_replaces_pending_output_with_cancellation() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());
    op.set_input(Ok("some text".to_string()));
    assert!(!op.is_cancelled());

    op.cancel();

    assert!(op.is_cancelled());
    assert!(matches!(op.output(), Err(OpError::Cancelled)));
}

#[test]
fn cancel_preserves_existing_input_failure() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());
    op.set_input(Err(OpError::other(anyhow::anyhow!("kernel"))));

    op.cancel();

    match op.output() {
        Err(err) => assert_eq!(err.to_string(), "kernel"),
        Ok(_) => panic!("cancel must propagate the original failure"),
    }
}

#[test]
fn double_cancel_is_a_noop() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());
    op.set_input(Ok("some text".to_string()));

    op.cancel();
    assert!(matches!(op.output(), Err(OpError::Cancelled)));

    // An explicitly overwritten output must survive a second cancel.
    op.set_output(Ok("recovered".to_string()));
    op.cancel();
    assert!(matches!(op.output(), Ok(value) if value == "recovered"));
}

#[test]
fn start_on_cancelled_operation_skips_transform() {
    init_tracing();
    let sched = scheduler();

    let ran = Arc::new(AtomicBool::new(false));
    let op = Operation::<String, String>::from_closure(sched.clone(), {
        let ran = Arc::clone(&ran);
        move |input| {
            ran.store(true, Ordering::SeqCst);
            input
        }
    });

    let fired = Arc::new(AtomicUsize::new(0));
    op.on_completed({
        let fired = Arc::clone(&fired);
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    op.cancel();
    op.start();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(op.is_finished());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // A second start is ignored outright.
    op.start();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn default_outputs_and_inputs_are_distinguished_failures() {
    init_tracing();
    let sched = scheduler();

    let passthrough = Operation::<String, String>::passthrough(sched.clone());
    assert!(matches!(passthrough.input(), Err(OpError::InputNotSet)));
    assert!(matches!(passthrough.output(), Err(OpError::OutputNotSet)));

    let root = Operation::<String, String>::from_closure(sched.clone(), |input| input);
    assert!(matches!(root.input(), Err(OpError::FirstInputNotSet)));

    let seeded = Operation::<String, String>::with_input(sched, "x".to_string(), |input| input);
    assert!(matches!(seeded.input(), Ok(value) if value == "x"));
}

#[test]
fn output_observer_sees_every_write() {
    init_tracing();
    let op = Operation::<String, String>::passthrough(scheduler());

    let seen: Arc<Mutex<Vec<Outcome<String>>>> = Arc::new(Mutex::new(Vec::new()));
    op.on_output_updated({
        let seen = Arc::clone(&seen);
        move |outcome| {
            seen.lock().unwrap().push(outcome.clone());
        }
    });

    op.set_output(Ok("first".to_string()));
    op.set_output(Err(OpError::Cancelled));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(matches!(&seen[0], Ok(value) if value == "first"));
    assert!(matches!(&seen[1], Err(OpError::Cancelled)));
}
