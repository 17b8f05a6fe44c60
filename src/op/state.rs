// src/op/state.rs

//! Operation lifecycle states.

use std::fmt;

/// Lifecycle state of a single operation.
///
/// Transitions:
/// - `Ready -> Executing` via the start path, only if not cancelled.
/// - `Executing -> Finished` via the finish path.
/// - any state `-> Cancelled` via cancel, exactly once.
/// - `Cancelled -> Finished` when the scheduler starts a cancelled
///   operation (it finishes immediately, without running its transform,
///   so observers are still notified).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    /// Constructed but not yet started.
    Ready,
    /// The transform is running (or about to).
    Executing,
    /// The finish path ran; the completion hook has been consumed.
    Finished,
    /// Cancelled; output already holds the cancellation failure.
    Cancelled,
}

impl OpState {
    /// Terminal with respect to ordinary forward transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OpState::Finished | OpState::Cancelled)
    }
}

impl fmt::Display for OpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpState::Ready => "ready",
            OpState::Executing => "executing",
            OpState::Finished => "finished",
            OpState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
