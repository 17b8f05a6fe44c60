use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use opchain::{Job, OpId, OpState, Schedulable, Scheduler};
use tracing::debug;

/// A synchronous scheduler for deterministic tests.
///
/// - Submissions run immediately on the calling thread, in dependency
///   order: an operation whose dependencies have not finished yet is
///   parked and picked up again as later submissions complete.
/// - Detached jobs run inline.
/// - Records both submission order and run order so tests can assert on
///   them (the production scheduler offers no such introspection).
pub struct InlineScheduler {
    seen: Mutex<HashSet<OpId>>,
    pending: Mutex<Vec<Arc<dyn Schedulable>>>,
    submissions: Mutex<Vec<OpId>>,
    ran: Mutex<Vec<OpId>>,
}

impl InlineScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            ran: Mutex::new(Vec::new()),
        })
    }

    /// Ids in the order they were submitted.
    pub fn submitted(&self) -> Vec<OpId> {
        self.submissions.lock().unwrap().clone()
    }

    /// Ids in the order their run started.
    pub fn ran(&self) -> Vec<OpId> {
        self.ran.lock().unwrap().clone()
    }

    fn drain(&self) {
        loop {
            let next = {
                let mut pending = self.pending.lock().unwrap();
                let position = pending
                    .iter()
                    .position(|op| op.state() == OpState::Cancelled || op.is_ready());
                match position {
                    Some(i) => pending.remove(i),
                    None => break,
                }
            };
            self.ran.lock().unwrap().push(next.id());
            next.run();
        }
    }
}

impl Scheduler for InlineScheduler {
    fn submit(&self, op: Arc<dyn Schedulable>) {
        if !self.seen.lock().unwrap().insert(op.id()) {
            debug!(op = %op.id(), "duplicate submission ignored");
            return;
        }
        debug!(op = %op.id(), "operation admitted");
        self.submissions.lock().unwrap().push(op.id());
        self.pending.lock().unwrap().push(op);
        self.drain();
    }

    fn run_detached(&self, job: Job) {
        job();
    }
}
