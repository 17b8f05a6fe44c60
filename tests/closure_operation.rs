use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use opchain::{OpError, Operation, Scheduler};
use opchain_test_utils::{InlineScheduler, init_tracing};

fn scheduler() -> Arc<dyn Scheduler> {
    InlineScheduler::new()
}

#[test]
fn root_closure_runs_with_first_input_marker() {
    init_tracing();
    let ran = Arc::new(AtomicBool::new(false));

    let op = Operation::<String, String>::from_closure(scheduler(), {
        let ran = Arc::clone(&ran);
        move |input| {
            assert!(matches!(input, Err(OpError::FirstInputNotSet)));
            ran.store(true, Ordering::SeqCst);
            Ok("done".to_string())
        }
    });
    op.start();

    assert!(ran.load(Ordering::SeqCst));
    assert!(matches!(op.output(), Ok(value) if value == "done"));
}

#[test]
fn submitted_closure_runs_through_scheduler() {
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
    sched.submit(op.clone());

    assert!(ran.load(Ordering::SeqCst));
    assert!(op.is_finished());
}

#[test]
fn cancelled_closure_never_runs() {
    init_tracing();
    let ran = Arc::new(AtomicBool::new(false));

    let op = Operation::<String, String>::from_closure(scheduler(), {
        let ran = Arc::clone(&ran);
        move |input| {
            ran.store(true, Ordering::SeqCst);
            input
        }
    });

    op.cancel();
    op.start();

    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn closure_failure_becomes_output() {
    init_tracing();
    let op = Operation::<String, String>::from_closure(scheduler(), |_input| {
        Err(OpError::other(anyhow::anyhow!("kernel")))
    });

    op.start();

    match op.output() {
        Err(err) => assert_eq!(err.to_string(), "kernel"),
        Ok(_) => panic!("expected the closure failure as output"),
    }
}

#[test]
fn seeded_closure_receives_its_value() {
    init_tracing();
    let op = Operation::<String, String>::with_input(
        scheduler(),
        "some data".to_string(),
        |input| input.map(|value| value.to_uppercase()),
    );

    op.start();

    assert!(matches!(op.output(), Ok(value) if value == "SOME DATA"));
}

#[test]
fn propagated_upstream_failure_skips_closure() {
    init_tracing();
    let ran = Arc::new(AtomicBool::new(false));

    let op = Operation::<String, String>::from_closure(scheduler(), {
        let ran = Arc::clone(&ran);
        move |input| {
            ran.store(true, Ordering::SeqCst);
            input
        }
    });
    op.set_input(Err(OpError::other(anyhow::anyhow!("upstream"))));

    op.start();

    assert!(!ran.load(Ordering::SeqCst));
    match op.output() {
        Err(err) => assert_eq!(err.to_string(), "upstream"),
        Ok(_) => panic!("upstream failure must flow through unchanged"),
    }
}

#[test]
fn plain_input_not_set_also_blocks_closure() {
    init_tracing();
    let ran = Arc::new(AtomicBool::new(false));

    let op = Operation::<String, String>::from_closure(scheduler(), {
        let ran = Arc::clone(&ran);
        move |input| {
            ran.store(true, Ordering::SeqCst);
            input
        }
    });
    // Only the FirstInputNotSet marker lets a closure run without input;
    // the generic "never set" failure does not.
    op.set_input(Err(OpError::InputNotSet));

    op.start();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(matches!(op.output(), Err(OpError::InputNotSet)));
}
