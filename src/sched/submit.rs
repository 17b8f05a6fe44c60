// src/sched/submit.rs

//! Whole-chain submission.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::sched::backend::{OpId, Schedulable};

/// Submit the terminal operation of a chain together with every
/// transitively reachable dependency, dependencies before dependents.
///
/// Each operation is submitted to its own scheduler handle, so a chain
/// can span queues. The depth-first walk yields a valid topological
/// submission order; that order is a nicety rather than a correctness
/// requirement, since a scheduler refuses to run an operation before its
/// dependencies finish regardless of admission order. Shared fan-in
/// nodes are submitted once.
pub fn submit_chain(terminal: &Arc<dyn Schedulable>) {
    let mut seen: HashSet<OpId> = HashSet::new();
    seen.insert(terminal.id());
    submit_dependencies(terminal.as_ref(), &mut seen);
    debug!(op = %terminal.id(), nodes = seen.len(), "submitting chain terminal");
    terminal.scheduler().submit(Arc::clone(terminal));
}

fn submit_dependencies(op: &dyn Schedulable, seen: &mut HashSet<OpId>) {
    for dep in op.dependencies() {
        if !seen.insert(dep.id()) {
            continue;
        }
        submit_dependencies(dep.as_ref(), seen);
        debug!(op = %dep.id(), "submitting chain dependency");
        dep.scheduler().submit(Arc::clone(&dep));
    }
}
