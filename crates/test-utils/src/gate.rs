use std::sync::{Arc, Condvar, Mutex};

/// A reusable latch for holding an operation's closure open until the
/// test decides to let it finish, so `Executing` states can be observed
/// from the outside.
#[derive(Clone, Default)]
pub struct Gate {
    inner: Arc<GateInner>,
}

#[derive(Default)]
struct GateInner {
    open: Mutex<bool>,
    cvar: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every waiter, current and future.
    pub fn open(&self) {
        let mut open = self.inner.open.lock().unwrap();
        *open = true;
        self.inner.cvar.notify_all();
    }

    /// Block the calling thread until the gate opens.
    pub fn wait(&self) {
        let mut open = self.inner.open.lock().unwrap();
        while !*open {
            open = self.inner.cvar.wait(open).unwrap();
        }
    }
}
