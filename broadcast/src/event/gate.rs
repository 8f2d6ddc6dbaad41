//! The condition every listener parks on.
//!
//! A [`Gate`] pairs a mutex-guarded [`Phase`] with a condition variable. It
//! starts `Armed` and leaves that phase exactly once, either because the
//! broadcast fired or because the session was torn down before it did.
//! Waiters loop on the phase, so spurious wake-ups are absorbed here.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Listeners may still register and park.
    Armed,
    /// The broadcast went out; parked listeners run their callbacks.
    Fired,
    /// The session ended without a broadcast; parked listeners exit quietly.
    Dismissed,
}

#[derive(Debug)]
pub(crate) struct Gate {
    phase: Mutex<Phase>,
    cond: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Armed),
            cond: Condvar::new(),
        }
    }

    // Callbacks never run under this lock and the guarded value is a plain
    // enum, so a poisoned lock still holds a valid phase.
    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn phase(&self) -> Phase {
        *self.lock()
    }

    /// Park the calling thread until the gate leaves `Armed`.
    ///
    /// `on_parked` runs while the lock is held, immediately before the
    /// thread starts waiting. Anyone who observes its effect and then takes
    /// the lock is ordered after this thread's wait began. Returns `true` if
    /// the gate fired, `false` if it was dismissed.
    pub(crate) fn park(&self, on_parked: impl FnOnce()) -> bool {
        let guard = self.lock();
        on_parked();
        let guard = self
            .cond
            .wait_while(guard, |phase| *phase == Phase::Armed)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == Phase::Fired
    }

    /// Wake every parked thread and let them run. Only the first transition
    /// out of `Armed` counts; returns whether this call made it.
    pub(crate) fn fire(&self) -> bool {
        self.leave(Phase::Fired)
    }

    /// Wake every parked thread without running their callbacks.
    pub(crate) fn dismiss(&self) -> bool {
        self.leave(Phase::Dismissed)
    }

    fn leave(&self, next: Phase) -> bool {
        let mut phase = self.lock();
        if *phase != Phase::Armed {
            return false;
        }
        *phase = next;
        self.cond.notify_all();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::bounded;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn new_gate_is_armed() {
        assert_eq!(Gate::new().phase(), Phase::Armed);
    }

    #[test]
    fn fire_only_counts_once() {
        let gate = Gate::new();

        assert!(gate.fire());
        assert!(!gate.fire());
        assert!(!gate.dismiss());
        assert_eq!(gate.phase(), Phase::Fired);
    }

    #[test]
    fn dismiss_blocks_later_fire() {
        let gate = Gate::new();

        assert!(gate.dismiss());
        assert!(!gate.fire());
        assert_eq!(gate.phase(), Phase::Dismissed);
    }

    #[test]
    fn park_returns_immediately_once_left() {
        let gate = Gate::new();
        gate.fire();

        let mut ran = false;
        assert!(gate.park(|| ran = true));
        assert!(ran);
    }

    #[test]
    fn parked_thread_wakes_on_fire() {
        let gate = Arc::new(Gate::new());
        let (parked_tx, parked_rx) = bounded(1);

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.park(|| {
                    parked_tx.send(()).unwrap();
                })
            })
        };

        parked_rx.recv().unwrap();
        assert!(gate.fire());
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn parked_thread_wakes_on_dismiss() {
        let gate = Arc::new(Gate::new());
        let (parked_tx, parked_rx) = bounded(1);

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.park(|| {
                    parked_tx.send(()).unwrap();
                })
            })
        };

        parked_rx.recv().unwrap();
        assert!(gate.dismiss());
        assert!(!waiter.join().unwrap());
    }
}
