//! Delivery contexts.
//!
//! Outcomes reach callers through a [`Dispatcher`]. Which context that is
//! (the completing task, a UI thread, a single-consumer queue) is a choice
//! made when the executor is built.

use std::sync::Arc;

/// A unit of delivery work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs delivery jobs on some execution context.
///
/// Implementations must run every job exactly once, in submission order when
/// they serialize onto a single context.
pub trait Dispatcher: Send + Sync + 'static {
    /// Schedule `job`.
    fn dispatch(&self, job: Job);
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Dispatcher for Inline {
    fn dispatch(&self, job: Job) {
        job();
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn dispatch(&self, job: Job) {
        (**self).dispatch(job);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn inline_runs_immediately() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        Inline.dispatch(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn shared_dispatcher_delegates() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(Inline);
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        dispatcher.dispatch(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert!(ran.load(Ordering::SeqCst));
    }
}
