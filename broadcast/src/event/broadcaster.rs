//! Owned, single-shot broadcast sessions.
//!
//! This module provides [`Broadcaster`], which registers listener callbacks
//! on their own threads, releases them all with one broadcast and joins them
//! afterwards.
//!
//! # Protocol
//!
//! 1. **Register**: [`listen()`](Broadcaster::listen) spawns a thread that
//!    takes the gate lock, reports that it is parked and waits. `listen`
//!    returns only after that report.
//! 2. **Broadcast**: [`trigger()`](Broadcaster::trigger) takes the same lock
//!    and wakes every parked listener. Because each `listen` already
//!    returned, every listener is waiting by then and none can miss it.
//! 3. **Join**: [`wait()`](Broadcaster::wait) joins the listeners in
//!    registration order and hands back what their callbacks returned.
//!
//! Callbacks run concurrently, in no particular order, and never under the
//! gate lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use rusty_broadcast::Broadcaster;
//!
//! let mut events = Broadcaster::new();
//! for id in 0..10 {
//!     events.listen(id, |id| id + 1)?;
//! }
//!
//! events.trigger();
//!
//! let results = events.wait()?;
//! assert_eq!(results, (1..=10).collect::<Vec<_>>());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, trace, warn};

use super::{
    gate::{Gate, Phase},
    listener::{self, ListenerId, ListenerState, Pending, StateCell},
};
use crate::core::{config::Config, error::BroadcastError, thread::ListenerThread};

struct Listener<R> {
    token: ListenerId,
    state: StateCell,
    thread: ListenerThread<Option<R>>,
}

/// One-shot broadcaster over listener threads.
///
/// `I` is the caller's identifier handed back to each callback, `R` is what
/// callbacks return. Callbacks own whatever they capture; results come back
/// from [`wait()`](Self::wait) once no listener is running any more.
///
/// A broadcaster serves exactly one broadcast. It cannot be cloned, and
/// `wait` consumes it.
///
/// # Preconditions
///
/// [`wait()`](Self::wait) must follow [`trigger()`](Self::trigger). Waiting
/// on an untriggered broadcaster with registered listeners blocks forever.
///
/// # Teardown
///
/// Dropping a broadcaster whose listeners were never joined dismisses them:
/// parked listeners wake up, skip their callbacks and are joined before the
/// drop returns.
pub struct Broadcaster<I, R = ()> {
    gate: Arc<Gate>,
    listeners: Vec<Listener<R>>,
    config: Config,
    _id: PhantomData<fn(I)>,
}

impl<I, R> Broadcaster<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Creates a broadcaster with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            gate: Arc::new(Gate::new()),
            listeners: Vec::new(),
            config,
            _id: PhantomData,
        }
    }

    /// Registers `callback` to run once with `id` when the broadcast fires.
    ///
    /// Spawns the listener thread and blocks until it is parked on the gate,
    /// so a [`trigger()`](Self::trigger) issued after this returns always
    /// reaches it. Identifiers are not checked for uniqueness; every call
    /// gets its own [`ListenerId`].
    ///
    /// # Errors
    ///
    /// - [`BroadcastError::AlreadyTriggered`] if the broadcast already fired.
    /// - [`BroadcastError::Dismissed`] if an earlier failure tore the session
    ///   down.
    /// - [`BroadcastError::Spawn`] if the listener thread could not be
    ///   started. The session is dismissed: listeners registered so far are
    ///   woken without running and joined.
    /// - [`BroadcastError::ListenerLost`] if the thread exited before it
    ///   parked. The session is dismissed as above.
    pub fn listen<F>(&mut self, id: I, callback: F) -> Result<ListenerId, BroadcastError>
    where
        F: FnOnce(I) -> R + Send + 'static,
    {
        let (pending, ready) = Pending::open(&self.gate)?;
        let token = pending.token;

        let thread = {
            let gate = Arc::clone(&self.gate);
            let state = pending.state.clone();
            ListenerThread::spawn(&self.config, token, move || {
                listener::run(token, &gate, ready, &state, id, callback)
            })
        };
        let thread = match thread {
            Ok(thread) => thread,
            Err(err) => {
                warn!("{err}");
                self.dismiss();
                return Err(err);
            }
        };

        let (token, state, thread) = match pending.parked(thread, ListenerThread::join) {
            Ok(parked) => parked,
            Err(err) => {
                self.dismiss();
                return Err(err);
            }
        };
        self.listeners.push(Listener {
            token,
            state,
            thread,
        });
        Ok(token)
    }

    /// Wakes every registered listener.
    ///
    /// Returns `true` for the call that fired the broadcast. Later calls, or
    /// calls on a dismissed session, wake nobody and return `false`.
    pub fn trigger(&self) -> bool {
        let fired = self.gate.fire();
        if fired {
            debug!("broadcast to {} listeners", self.listeners.len());
        } else {
            debug!("trigger ignored, gate is {:?}", self.gate.phase());
        }
        fired
    }

    /// Joins every listener in registration order and returns the callback
    /// results in that order.
    ///
    /// Must be called after [`trigger()`](Self::trigger); see the type-level
    /// preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::ListenerPanicked`] for the first listener
    /// whose callback panicked. The remaining listeners are still joined
    /// before this returns.
    pub fn wait(mut self) -> Result<Vec<R>, BroadcastError> {
        let mut results = Vec::with_capacity(self.listeners.len());
        let mut failure = None;

        for listener in self.listeners.drain(..) {
            match listener.thread.join() {
                Ok(Some(result)) => results.push(result),
                Ok(None) => trace!("{} left without running", listener.token),
                Err(err) => {
                    warn!("{err}");
                    failure.get_or_insert(err);
                }
            }
        }

        debug!("joined {} listeners", results.len());
        match failure {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn is_triggered(&self) -> bool {
        self.gate.phase() == Phase::Fired
    }

    /// Tokens of the registered listeners, in registration order.
    pub fn listeners(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.listeners.iter().map(|listener| listener.token)
    }

    /// Current state of a registered listener, or `None` for tokens this
    /// broadcaster did not issue.
    pub fn state(&self, token: ListenerId) -> Option<ListenerState> {
        self.listeners
            .iter()
            .find(|listener| listener.token == token)
            .map(|listener| listener.state.get())
    }
}

impl<I, R> Broadcaster<I, R> {
    /// Dismisses the gate and joins whatever is registered.
    fn dismiss(&mut self) {
        if self.gate.dismiss() {
            debug!("dismissing {} parked listeners", self.listeners.len());
        }
        for listener in self.listeners.drain(..) {
            if let Err(err) = listener.thread.join() {
                warn!("{err}");
            }
        }
    }
}

impl<I, R> Default for Broadcaster<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, R> Drop for Broadcaster<I, R> {
    fn drop(&mut self) {
        if !self.listeners.is_empty() {
            self.dismiss();
        }
    }
}

impl<I, R> fmt::Debug for Broadcaster<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("phase", &self.gate.phase())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish()
    }
}
