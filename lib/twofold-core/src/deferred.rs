//! Settle-once values with chained observers.
//!
//! A [`Deferred`] starts pending and is settled exactly once, either with a
//! value (through a [`Resolver`]) or with an error (through a [`Rejecter`]).
//! Observers are registered with [`Deferred::on_success`],
//! [`Deferred::on_failure`] and [`Deferred::on_settled`]:
//!
//! - each category holds a single callback; registering again replaces it,
//! - a callback registered after settlement runs immediately with the stored
//!   outcome,
//! - on settlement the success or failure callback runs first, then the
//!   settled callback, on the thread that settled.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use twofold_core::Deferred;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//!
//! let deferred = Deferred::<u32, String>::new(|resolver, _rejecter| {
//!     resolver.resolve(42);
//! });
//!
//! // Registered after settlement: runs right away.
//! deferred.on_success(move |value| log.lock().unwrap().push(*value));
//! assert_eq!(*seen.lock().unwrap(), vec![42]);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type FailureCallback<E> = Box<dyn FnOnce(&E) + Send>;
type SettledCallback = Box<dyn FnOnce() + Send>;

/// Observable state of a [`Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredState {
    /// Not settled yet.
    Pending,
    /// Settled with a value. Terminal.
    Succeeded,
    /// Settled with an error. Terminal.
    Failed,
}

enum Settlement<T, E> {
    Succeeded(Arc<T>),
    Failed(Arc<E>),
}

impl<T, E> Clone for Settlement<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Succeeded(value) => Self::Succeeded(Arc::clone(value)),
            Self::Failed(error) => Self::Failed(Arc::clone(error)),
        }
    }
}

struct Inner<T, E> {
    settlement: Option<Settlement<T, E>>,
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback<E>>,
    on_settled: Option<SettledCallback>,
}

type Shared<T, E> = Arc<Mutex<Inner<T, E>>>;

fn lock<T, E>(shared: &Shared<T, E>) -> MutexGuard<'_, Inner<T, E>> {
    // Callbacks never run under the lock, so a poisoned mutex still holds a
    // consistent state.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stores the settlement and fires the callbacks registered so far.
///
/// Returns `false` without touching anything if already settled.
fn settle<T, E>(shared: &Shared<T, E>, settlement: Settlement<T, E>) -> bool {
    let mut inner = lock(shared);
    if inner.settlement.is_some() {
        return false;
    }
    inner.settlement = Some(settlement.clone());
    let on_success = inner.on_success.take();
    let on_failure = inner.on_failure.take();
    let on_settled = inner.on_settled.take();
    drop(inner);

    match &settlement {
        Settlement::Succeeded(value) => {
            if let Some(callback) = on_success {
                callback(value);
            }
        }
        Settlement::Failed(error) => {
            if let Some(callback) = on_failure {
                callback(error);
            }
        }
    }
    if let Some(callback) = on_settled {
        callback();
    }
    true
}

/// A write-once asynchronous result with replaceable observers.
///
/// Cloning a `Deferred` yields another handle on the same value.
pub struct Deferred<T, E> {
    shared: Shared<T, E>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T, E> Deferred<T, E> {
    /// Create a deferred value driven by `executor`.
    ///
    /// The executor runs immediately and receives the two settling handles.
    /// It may settle right away, hand the handles to another task, or never
    /// settle at all.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>, Rejecter<T, E>),
    {
        let (deferred, resolver, rejecter) = Self::pending();
        executor(resolver, rejecter);
        deferred
    }

    /// Create a pending deferred value along with its settling handles.
    #[must_use]
    pub fn pending() -> (Self, Resolver<T, E>, Rejecter<T, E>) {
        let shared = Arc::new(Mutex::new(Inner {
            settlement: None,
            on_success: None,
            on_failure: None,
            on_settled: None,
        }));
        let resolver = Resolver {
            shared: Arc::clone(&shared),
        };
        let rejecter = Rejecter {
            shared: Arc::clone(&shared),
        };
        (Self { shared }, resolver, rejecter)
    }

    /// Create a deferred value already settled with `value`.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self::new(|resolver, _| {
            resolver.resolve(value);
        })
    }

    /// Create a deferred value already settled with `error`.
    #[must_use]
    pub fn rejected(error: E) -> Self {
        Self::new(|_, rejecter| {
            rejecter.reject(error);
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DeferredState {
        match lock(&self.shared).settlement {
            None => DeferredState::Pending,
            Some(Settlement::Succeeded(_)) => DeferredState::Succeeded,
            Some(Settlement::Failed(_)) => DeferredState::Failed,
        }
    }

    /// Returns `true` once a value or an error has been stored.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state() != DeferredState::Pending
    }

    /// The stored outcome, if settled.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<Arc<T>, Arc<E>>> {
        lock(&self.shared)
            .settlement
            .as_ref()
            .map(|settlement| match settlement {
                Settlement::Succeeded(value) => Ok(Arc::clone(value)),
                Settlement::Failed(error) => Err(Arc::clone(error)),
            })
    }

    /// Observe the value.
    ///
    /// Replaces any previously registered success callback. Runs immediately
    /// if already settled with a value; never runs if settled with an error.
    pub fn on_success<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let mut inner = lock(&self.shared);
        match inner.settlement.clone() {
            None => inner.on_success = Some(Box::new(callback)),
            Some(Settlement::Succeeded(value)) => {
                drop(inner);
                callback(&value);
            }
            Some(Settlement::Failed(_)) => {}
        }
        self
    }

    /// Observe the error.
    ///
    /// Replaces any previously registered failure callback. Runs immediately
    /// if already settled with an error; never runs if settled with a value.
    pub fn on_failure<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let mut inner = lock(&self.shared);
        match inner.settlement.clone() {
            None => inner.on_failure = Some(Box::new(callback)),
            Some(Settlement::Failed(error)) => {
                drop(inner);
                callback(&error);
            }
            Some(Settlement::Succeeded(_)) => {}
        }
        self
    }

    /// Observe settlement, whichever way it went.
    ///
    /// Replaces any previously registered settled callback. Runs immediately
    /// if already settled.
    pub fn on_settled<F>(&self, callback: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = lock(&self.shared);
        if inner.settlement.is_some() {
            drop(inner);
            callback();
        } else {
            inner.on_settled = Some(Box::new(callback));
        }
        self
    }
}

/// Handle that settles a [`Deferred`] with a value.
pub struct Resolver<T, E> {
    shared: Shared<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl<T, E> Resolver<T, E> {
    /// Settle with `value`.
    ///
    /// Returns `false`, dropping `value`, if the deferred was already settled.
    pub fn resolve(&self, value: T) -> bool {
        settle(&self.shared, Settlement::Succeeded(Arc::new(value)))
    }
}

/// Handle that settles a [`Deferred`] with an error.
pub struct Rejecter<T, E> {
    shared: Shared<T, E>,
}

impl<T, E> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter").finish_non_exhaustive()
    }
}

impl<T, E> Rejecter<T, E> {
    /// Settle with `error`.
    ///
    /// Returns `false`, dropping `error`, if the deferred was already settled.
    pub fn reject(&self, error: E) -> bool {
        settle(&self.shared, Settlement::Failed(Arc::new(error)))
    }
}
