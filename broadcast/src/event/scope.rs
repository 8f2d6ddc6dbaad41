//! Broadcast sessions on scoped threads.
//!
//! [`scope()`] runs the listen / trigger / join protocol on
//! [`std::thread::scope`] threads. Callbacks may then borrow state owned by
//! the caller, including exclusive borrows of individual slots, and need no
//! synchronization of their own: the caller can only look at that state
//! again once `scope` has returned, which is after every listener was joined.
//!
//! ```rust,ignore
//! let mut notified = [0u8; 10];
//!
//! rusty_broadcast::scope(|events| {
//!     for (id, slot) in notified.iter_mut().enumerate() {
//!         events.listen(id, move |_| *slot = 1)?;
//!     }
//!     events.trigger();
//!     Ok::<_, BroadcastError>(())
//! })??;
//!
//! assert_eq!(notified, [1; 10]);
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, Scope};

use log::{debug, warn};

use super::{
    gate::{Gate, Phase},
    listener::{self, ListenerId, ListenerState, Pending, StateCell},
};
use crate::core::{config::Config, error::BroadcastError, thread::ScopedListenerThread};

struct ScopedListener<'scope> {
    token: ListenerId,
    state: StateCell,
    thread: ScopedListenerThread<'scope, Option<()>>,
}

/// Broadcaster handed to the closure passed to [`scope()`].
///
/// Offers the same registration and trigger operations as
/// [`Broadcaster`](super::Broadcaster); joining happens when the closure
/// returns. If the closure returns, or unwinds, without triggering, the
/// listeners are dismissed so the scope can end.
pub struct ScopedBroadcaster<'scope, 'env: 'scope, I> {
    scope: &'scope Scope<'scope, 'env>,
    gate: Arc<Gate>,
    config: Config,
    listeners: RefCell<Vec<ScopedListener<'scope>>>,
    _id: PhantomData<fn(I)>,
}

/// Runs a broadcast session whose callbacks may borrow from the caller.
///
/// Every listener registered inside `f` is joined before this returns.
///
/// # Errors
///
/// Returns [`BroadcastError::ListenerPanicked`] for the first listener whose
/// callback panicked; all other listeners are still joined first.
pub fn scope<'env, I, F, T>(f: F) -> Result<T, BroadcastError>
where
    F: for<'scope> FnOnce(&ScopedBroadcaster<'scope, 'env, I>) -> T,
{
    scope_with_config(Config::default(), f)
}

/// [`scope()`] with explicit listener thread settings.
pub fn scope_with_config<'env, I, F, T>(config: Config, f: F) -> Result<T, BroadcastError>
where
    F: for<'scope> FnOnce(&ScopedBroadcaster<'scope, 'env, I>) -> T,
{
    thread::scope(move |scope| {
        let events = ScopedBroadcaster {
            scope,
            gate: Arc::new(Gate::new()),
            config,
            listeners: RefCell::new(Vec::new()),
            _id: PhantomData,
        };
        let output = f(&events);
        events.finish().map(|()| output)
    })
}

impl<'scope, 'env: 'scope, I> ScopedBroadcaster<'scope, 'env, I>
where
    I: Send + 'scope,
{
    /// Registers `callback` to run once with `id` when the broadcast fires.
    ///
    /// Blocks until the listener is parked, exactly like
    /// [`Broadcaster::listen`](super::Broadcaster::listen).
    ///
    /// # Errors
    ///
    /// [`BroadcastError::AlreadyTriggered`], [`BroadcastError::Dismissed`],
    /// [`BroadcastError::Spawn`] or [`BroadcastError::ListenerLost`], with the
    /// same meaning as for the owned broadcaster. After a spawn failure the
    /// remaining listeners are dismissed and joined when the scope ends.
    pub fn listen<F>(&self, id: I, callback: F) -> Result<ListenerId, BroadcastError>
    where
        F: FnOnce(I) + Send + 'scope,
    {
        let (pending, ready) = Pending::open(&self.gate)?;
        let token = pending.token;

        let thread = {
            let gate = Arc::clone(&self.gate);
            let state = pending.state.clone();
            ScopedListenerThread::spawn(self.scope, &self.config, token, move || {
                listener::run(token, &gate, ready, &state, id, callback)
            })
        };
        let thread = match thread {
            Ok(thread) => thread,
            Err(err) => {
                warn!("{err}");
                self.gate.dismiss();
                return Err(err);
            }
        };

        let (token, state, thread) = match pending.parked(thread, ScopedListenerThread::join) {
            Ok(parked) => parked,
            Err(err) => {
                self.gate.dismiss();
                return Err(err);
            }
        };
        self.listeners.borrow_mut().push(ScopedListener {
            token,
            state,
            thread,
        });
        Ok(token)
    }
}

impl<'scope, 'env: 'scope, I> ScopedBroadcaster<'scope, 'env, I> {
    /// Wakes every registered listener. Returns `true` for the call that
    /// fired the broadcast.
    pub fn trigger(&self) -> bool {
        let fired = self.gate.fire();
        if fired {
            debug!("broadcast to {} scoped listeners", self.len());
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    pub fn is_triggered(&self) -> bool {
        self.gate.phase() == Phase::Fired
    }

    pub fn state(&self, token: ListenerId) -> Option<ListenerState> {
        self.listeners
            .borrow()
            .iter()
            .find(|listener| listener.token == token)
            .map(|listener| listener.state.get())
    }

    /// Joins every listener, dismissing them first if nothing triggered.
    fn finish(&self) -> Result<(), BroadcastError> {
        if self.gate.dismiss() {
            debug!(
                "scope ended before trigger, dismissing {} listeners",
                self.len()
            );
        }

        let mut failure = None;
        for listener in self.listeners.take() {
            if let Err(err) = listener.thread.join() {
                warn!("{err}");
                failure.get_or_insert(err);
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<'scope, 'env: 'scope, I> Drop for ScopedBroadcaster<'scope, 'env, I> {
    fn drop(&mut self) {
        // Only does anything when the closure unwound: parked listeners
        // would otherwise keep the scope from ever ending.
        self.gate.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callbacks_write_borrowed_slots() {
        let mut notified = [0u8; 10];

        scope(|events| {
            for (id, slot) in notified.iter_mut().enumerate() {
                events.listen(id, move |_| *slot = 1).unwrap();
            }
            events.trigger();
        })
        .unwrap();

        assert_eq!(notified, [1; 10]);
    }

    #[test]
    fn callbacks_receive_their_ids() {
        let mut seen = vec![usize::MAX; 8];

        scope(|events| {
            for slot in seen.iter_mut() {
                let id = events.len();
                events.listen(id, move |id| *slot = id).unwrap();
            }
            events.trigger();
        })
        .unwrap();

        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn trigger_right_after_listen_loses_no_wakeup() {
        for _ in 0..200 {
            let counter = AtomicUsize::new(0);

            scope(|events| {
                for id in 0..4 {
                    let counter = &counter;
                    events
                        .listen(id, move |_| {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                }
                events.trigger();
            })
            .unwrap();

            assert_eq!(counter.load(Ordering::SeqCst), 4);
        }
    }

    #[test]
    fn scope_returns_closure_output() {
        let output = scope(|events| {
            events.listen(0, |_| {}).unwrap();
            events.trigger();
            "done"
        })
        .unwrap();

        assert_eq!(output, "done");
    }

    #[test]
    fn untriggered_scope_dismisses_listeners() {
        let counter = AtomicUsize::new(0);

        scope(|events| {
            for id in 0..3 {
                let counter = &counter;
                events
                    .listen(id, move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            }
            assert_eq!(events.len(), 3);
        })
        .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listen_reports_waiting_and_rejects_after_trigger() {
        scope(|events| {
            let token = events.listen(0, |_| {}).unwrap();
            assert_eq!(events.state(token), Some(ListenerState::Waiting));

            assert!(events.trigger());
            assert!(!events.trigger());
            assert!(events.is_triggered());
            assert!(matches!(
                events.listen(1, |_| {}),
                Err(BroadcastError::AlreadyTriggered)
            ));
        })
        .unwrap();
    }

    #[test]
    fn panicking_callback_is_reported() {
        let counter = AtomicUsize::new(0);

        let result = scope(|events| {
            for id in 0..3 {
                let counter = &counter;
                events
                    .listen(id, move |id| {
                        if id == 1 {
                            panic!("listener {id} failed");
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            }
            events.trigger();
        });

        assert!(matches!(
            result,
            Err(BroadcastError::ListenerPanicked { .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn custom_config_names_threads() {
        let mut names = vec![None; 2];
        let config = Config::new().with_thread_name_prefix("scoped");

        scope_with_config(config, |events| {
            for (id, name) in names.iter_mut().enumerate() {
                events
                    .listen(id, move |_| {
                        *name = thread::current().name().map(String::from);
                    })
                    .unwrap();
            }
            events.trigger();
        })
        .unwrap();

        for name in names {
            assert!(name.unwrap().starts_with("scoped-"));
        }
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn spawn_failure_dismisses_scope() {
        let config = Config::new().with_stack_size(1 << 60);

        scope_with_config(config, |events| {
            let err = events.listen(0, |_| {}).unwrap_err();

            assert!(matches!(err, BroadcastError::Spawn { .. }));
            assert!(matches!(
                events.listen(1, |_| {}),
                Err(BroadcastError::Dismissed)
            ));
            assert!(!events.trigger());
            assert!(events.is_empty());
        })
        .unwrap();
    }
}
