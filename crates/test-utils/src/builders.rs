#![allow(dead_code)]

use std::sync::Arc;

use opchain::{OpError, Operation, Scheduler};

/// An identity stage: forwards its input outcome untouched.
pub fn identity(scheduler: &Arc<dyn Scheduler>) -> Arc<Operation<String, String>> {
    Operation::from_closure(Arc::clone(scheduler), |input| input)
}

/// An identity stage pre-seeded with `value`.
pub fn seeded(scheduler: &Arc<dyn Scheduler>, value: &str) -> Arc<Operation<String, String>> {
    Operation::with_input(Arc::clone(scheduler), value.to_string(), |input| input)
}

/// A stage that always fails with the given message.
pub fn failing(scheduler: &Arc<dyn Scheduler>, message: &str) -> Arc<Operation<String, String>> {
    let message = message.to_string();
    Operation::from_closure(Arc::clone(scheduler), move |_input| {
        Err(OpError::other(anyhow::anyhow!(message)))
    })
}

/// A linear chain: a stage seeded with `seed` followed by `extra`
/// identity stages. Returns the terminal operation.
pub fn identity_chain(
    scheduler: &Arc<dyn Scheduler>,
    seed: &str,
    extra: usize,
) -> Arc<Operation<String, String>> {
    let mut terminal = seeded(scheduler, seed);
    for _ in 0..extra {
        terminal = terminal.then(identity(scheduler));
    }
    terminal
}
