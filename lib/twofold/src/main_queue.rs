//! A single-consumer delivery context.
//!
//! [`MainQueue`] is a [`Dispatcher`] that hands every job to one [`MainLoop`].
//! Whoever owns the loop (a UI thread, the main task) drains it, so all
//! outcome callbacks run on that one context, one after the other, in the
//! order they were dispatched.
//!
//! # Example
//!
//! ```ignore
//! let (queue, mut main_loop) = twofold::main_queue();
//! let executor = RequestExecutor::builder(HyperTransport::new())
//!     .dispatcher(queue)
//!     .build();
//!
//! executor.execute_with(request, |outcome: Outcome<User, ApiError>| {
//!     // runs inside main_loop.turn()
//! });
//! main_loop.turn().await;
//! ```

use tokio::sync::mpsc;
use tracing::warn;

use crate::{Dispatcher, Job};

/// Create a connected queue/loop pair.
#[must_use]
pub fn main_queue() -> (MainQueue, MainLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (MainQueue { sender }, MainLoop { receiver })
}

/// Sending half: dispatches jobs onto the [`MainLoop`].
#[derive(Debug, Clone)]
pub struct MainQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl Dispatcher for MainQueue {
    fn dispatch(&self, job: Job) {
        if let Err(mpsc::error::SendError(job)) = self.sender.send(job) {
            // Nobody drains the loop anymore; the outcome still has to land.
            warn!("main loop is gone, delivering inline");
            job();
        }
    }
}

/// Receiving half: runs dispatched jobs on the context that drives it.
#[derive(Debug)]
pub struct MainLoop {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl MainLoop {
    /// Wait for the next job and run it.
    ///
    /// Returns `false` once every [`MainQueue`] is dropped and the queue is
    /// empty.
    pub async fn turn(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run jobs until every [`MainQueue`] is dropped.
    pub async fn run(&mut self) {
        while self.turn().await {}
    }

    /// Run the jobs already queued, without waiting. Returns how many ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Blocking variant of [`MainLoop::turn`] for a plain thread.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_turn(&mut self) -> bool {
        match self.receiver.blocking_recv() {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::*;

    #[test]
    fn jobs_run_in_order_when_drained() {
        let (queue, mut main_loop) = main_queue();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let seen = Arc::clone(&seen);
            queue.dispatch(Box::new(move || seen.lock().expect("seen").push(n)));
        }
        assert!(seen.lock().expect("seen").is_empty());

        assert_eq!(main_loop.run_until_idle(), 3);
        assert_eq!(*seen.lock().expect("seen"), vec![0, 1, 2]);
    }

    #[test]
    fn jobs_run_on_the_draining_thread() {
        let (queue, mut main_loop) = main_queue();
        let main_thread = thread::current().id();
        let ran_on = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&ran_on);
        thread::spawn(move || {
            queue.dispatch(Box::new(move || {
                *slot.lock().expect("slot") = Some(thread::current().id());
            }));
        })
        .join()
        .expect("dispatching thread");

        assert!(main_loop.blocking_turn());
        assert_eq!(*ran_on.lock().expect("slot"), Some(main_thread));
        // The only queue was dropped with the thread.
        assert!(!main_loop.blocking_turn());
    }

    #[test]
    fn dropped_loop_delivers_inline() {
        let (queue, main_loop) = main_queue();
        drop(main_loop);

        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        queue.dispatch(Box::new(move || *flag.lock().expect("flag") = true));

        assert!(*ran.lock().expect("flag"));
    }

    #[tokio::test]
    async fn run_stops_when_queues_are_dropped() {
        let (queue, mut main_loop) = main_queue();
        let seen = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&seen);
        queue.dispatch(Box::new(move || *counter.lock().expect("seen") += 1));
        drop(queue);

        main_loop.run().await;
        assert_eq!(*seen.lock().expect("seen"), 1);
    }
}
