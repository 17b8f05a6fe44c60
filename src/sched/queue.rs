// src/sched/queue.rs

//! Production scheduler: a Tokio event loop plus a blocking dispatch
//! pool.
//!
//! The loop owns the pending set and is the single place scheduling
//! decisions are made. Everything flows in as [`QueueEvent`]s:
//! - `Submit` admits an operation (duplicates are ignored by id),
//! - `Completed` is posted by a worker when an operation's run returns,
//! - `Detached` runs a plain job with no dependency tracking,
//! - `Shutdown` is sent when the last handle drops; the loop drains
//!   in-flight work and exits once idle.
//!
//! An operation is dispatched when it is ready (still `Ready` with every
//! dependency finished) or already cancelled, in which case running it
//! just drives its immediate finish path so its completion hook still
//! fires. Transforms are synchronous, so each dispatch lands on
//! `spawn_blocking`.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::op::OpState;
use crate::sched::backend::{Job, OpId, Schedulable, Scheduler};

enum QueueEvent {
    Submit(Arc<dyn Schedulable>),
    Completed(OpId),
    Detached(Job),
    Shutdown,
}

/// Dependency-honoring work queue backed by the ambient Tokio runtime.
///
/// Must be created inside a Tokio runtime context; the event loop is
/// spawned at construction time.
pub struct PoolScheduler {
    tx: mpsc::UnboundedSender<QueueEvent>,
}

impl PoolScheduler {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::event_loop(rx, tx.clone()));
        Arc::new(Self { tx })
    }

    async fn event_loop(
        mut rx: mpsc::UnboundedReceiver<QueueEvent>,
        tx: mpsc::UnboundedSender<QueueEvent>,
    ) {
        let mut pending: Vec<Arc<dyn Schedulable>> = Vec::new();
        let mut seen: HashSet<OpId> = HashSet::new();
        let mut running: usize = 0;
        let mut closing = false;

        while let Some(event) = rx.recv().await {
            match event {
                QueueEvent::Submit(op) => {
                    if seen.insert(op.id()) {
                        debug!(op = %op.id(), "operation admitted");
                        pending.push(op);
                    } else {
                        debug!(op = %op.id(), "duplicate submission ignored");
                    }
                }
                QueueEvent::Completed(id) => {
                    running = running.saturating_sub(1);
                    debug!(op = %id, running, "operation run returned");
                }
                QueueEvent::Detached(job) => {
                    tokio::task::spawn_blocking(move || job());
                }
                QueueEvent::Shutdown => {
                    debug!(pending = pending.len(), running, "scheduler handle dropped");
                    closing = true;
                }
            }

            running += dispatch_ready(&mut pending, &tx);

            if closing && running == 0 {
                break;
            }
        }

        if !pending.is_empty() {
            warn!(
                remaining = pending.len(),
                "scheduler stopped with operations still pending"
            );
        }
        debug!("scheduler event loop exiting");
    }
}

impl Scheduler for PoolScheduler {
    fn submit(&self, op: Arc<dyn Schedulable>) {
        if self.tx.send(QueueEvent::Submit(op)).is_err() {
            warn!("submit after scheduler stopped; operation dropped");
        }
    }

    fn run_detached(&self, job: Job) {
        if self.tx.send(QueueEvent::Detached(job)).is_err() {
            warn!("detached job after scheduler stopped; job dropped");
        }
    }
}

impl Drop for PoolScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(QueueEvent::Shutdown);
    }
}

/// Move every dispatchable operation out of `pending` onto the blocking
/// pool; returns how many were dispatched.
fn dispatch_ready(
    pending: &mut Vec<Arc<dyn Schedulable>>,
    tx: &mpsc::UnboundedSender<QueueEvent>,
) -> usize {
    let mut spawned = 0;
    let mut i = 0;
    while i < pending.len() {
        let dispatchable = {
            let op = &pending[i];
            op.state() == OpState::Cancelled || op.is_ready()
        };
        if dispatchable {
            let op = pending.swap_remove(i);
            let tx = tx.clone();
            debug!(op = %op.id(), "dispatching operation");
            tokio::task::spawn_blocking(move || {
                let id = op.id();
                op.run();
                let _ = tx.send(QueueEvent::Completed(id));
            });
            spawned += 1;
        } else {
            i += 1;
        }
    }
    spawned
}
