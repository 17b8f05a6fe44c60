// src/lib.rs

//! Typed, chainable operations over a dependency-aware work queue.
//!
//! The building blocks:
//! - [`Operation`]: one stage of work with a typed input, a typed
//!   output and a four-state lifecycle.
//! - [`then`](Operation::then): chains stages so that one stage's
//!   output becomes the next stage's input on completion, failures
//!   included.
//! - [`Scheduler`] / [`submit_chain`]: the work-queue capability a
//!   chain runs on, with [`PoolScheduler`] as the shipped
//!   implementation.
//! - [`UseCase`]: success/error/always observation and cancellation
//!   over a chain.
//!
//! ```no_run
//! use opchain::{Operation, PoolScheduler, UseCase};
//!
//! # #[tokio::main] async fn main() {
//! let queue = PoolScheduler::new();
//!
//! let fetch = Operation::with_input(queue.clone(), 21u32, |input| input.map(|n| n * 2));
//! let render = Operation::from_closure(queue.clone(), |input| input.map(|n: u32| n.to_string()));
//!
//! let use_case: UseCase<String> = UseCase::new();
//! use_case.prepare_execution(fetch.then(render), queue.clone());
//! use_case
//!     .success(|text| println!("{text}"))
//!     .error(|err| eprintln!("{err}"))
//!     .perform();
//! # }
//! ```

pub mod errors;
pub mod op;
pub mod sched;
pub mod usecase;

pub use errors::{OpError, Outcome};
pub use op::{CompletionHook, OpState, Operation};
pub use sched::{Job, OpId, PoolScheduler, Schedulable, Scheduler, submit_chain};
pub use usecase::{Produces, UseCase};
