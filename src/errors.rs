// src/errors.rs

//! Crate-wide error taxonomy and the `Outcome` currency.

use std::sync::Arc;

use thiserror::Error;

/// Tagged success/failure value threaded between operation stages.
///
/// Outcomes are replaced wholesale, never mutated in place, and are
/// copied by value across stage boundaries (which is why [`OpError`]
/// is cheaply cloneable).
pub type Outcome<T> = std::result::Result<T, OpError>;

#[derive(Error, Debug, Clone)]
pub enum OpError {
    /// Input was read before anything assigned it.
    #[error("input has not been set")]
    InputNotSet,

    /// Distinguished root marker: no upstream stage has fed this
    /// operation yet. Unlike every other failure, this one does not
    /// block a closure from running.
    #[error("no upstream operation has supplied input yet")]
    FirstInputNotSet,

    /// Output was read before the operation produced one.
    #[error("output has not been produced")]
    OutputNotSet,

    /// The operation was cancelled before or while running.
    #[error("operation was cancelled")]
    Cancelled,

    /// Arbitrary application error returned by a closure or injected
    /// via `UseCase::propagate`.
    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl OpError {
    /// Wrap an application error so it can ride inside an [`Outcome`].
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        OpError::Other(Arc::new(err.into()))
    }

    /// True for the root sentinel, the only failure a closure may run on.
    pub fn is_first_input_marker(&self) -> bool {
        matches!(self, OpError::FirstInputNotSet)
    }
}

impl From<anyhow::Error> for OpError {
    fn from(err: anyhow::Error) -> Self {
        OpError::Other(Arc::new(err))
    }
}
