use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use log::{debug, trace, warn};

use super::{
    gate::{Gate, Phase},
    signal::{self, Ready, Started},
};
use crate::core::error::BroadcastError;

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(0);

/// Opaque token identifying one registration.
///
/// Tokens come from a process-wide counter, so two registrations never share
/// one, even when they carry the same caller identifier and identical
/// callbacks. Copying a token keeps its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value of the token.
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Lifecycle of a listener thread.
///
/// A listener only moves forward through these states. `Waiting` becomes
/// `Notified` through a trigger and nothing else. `Dismissed` is the
/// terminal state of listeners torn down before any trigger.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Registered, thread not yet running.
    Created = 0,
    /// Thread running, taking the gate lock.
    AcquiringLock = 1,
    /// Parked on the gate. `listen` returns once this is reached.
    Waiting = 2,
    /// Woken by the broadcast.
    Notified = 3,
    /// Callback executing.
    RunningCallback = 4,
    /// Callback finished.
    Done = 5,
    /// Woken by teardown; the callback never ran.
    Dismissed = 6,
}

impl ListenerState {
    fn from_repr(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::AcquiringLock,
            2 => Self::Waiting,
            3 => Self::Notified,
            4 => Self::RunningCallback,
            5 => Self::Done,
            6 => Self::Dismissed,
            _ => unreachable!("invalid listener state {value}"),
        }
    }

    /// `true` once the listener thread has nothing left to do.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Done | Self::Dismissed)
    }
}

/// State shared between a listener thread and the registry that owns it.
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ListenerState::Created as u8)))
    }

    pub(crate) fn get(&self) -> ListenerState {
        ListenerState::from_repr(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ListenerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// A registration whose thread has not yet reported that it is parked.
pub(crate) struct Pending {
    pub(crate) token: ListenerId,
    pub(crate) state: StateCell,
    started: Started,
}

impl Pending {
    /// Issues a token for a new listener, provided the gate still admits
    /// one. The returned [`Ready`] belongs to the listener thread.
    pub(crate) fn open(gate: &Gate) -> Result<(Self, Ready), BroadcastError> {
        match gate.phase() {
            Phase::Armed => {}
            Phase::Fired => return Err(BroadcastError::AlreadyTriggered),
            Phase::Dismissed => return Err(BroadcastError::Dismissed),
        }

        let token = ListenerId::next();
        let (ready, started) = signal::ready();
        debug!("registering {token}");
        let pending = Self {
            token,
            state: StateCell::new(),
            started,
        };
        Ok((pending, ready))
    }

    /// Blocks until the listener thread is parked on the gate and hands the
    /// thread back. If the thread went away first it is joined and the
    /// listener reported lost.
    pub(crate) fn parked<H, T>(
        self,
        thread: H,
        join: impl FnOnce(H) -> Result<T, BroadcastError>,
    ) -> Result<(ListenerId, StateCell, H), BroadcastError> {
        if self.started.wait() {
            trace!("{} is waiting", self.token);
            return Ok((self.token, self.state, thread));
        }

        if let Err(err) = join(thread) {
            warn!("{err}");
        }
        let err = BroadcastError::ListenerLost {
            listener: self.token,
        };
        warn!("{err}");
        Err(err)
    }
}

/// Body of every listener thread: park on the gate, signal readiness while
/// the lock is held, then run the callback once if the gate fired.
pub(crate) fn run<I, R, F>(
    listener: ListenerId,
    gate: &Gate,
    ready: Ready,
    state: &StateCell,
    id: I,
    callback: F,
) -> Option<R>
where
    F: FnOnce(I) -> R,
{
    state.set(ListenerState::AcquiringLock);
    let fired = gate.park(|| {
        state.set(ListenerState::Waiting);
        ready.signal();
    });

    if !fired {
        trace!("{listener} dismissed");
        state.set(ListenerState::Dismissed);
        return None;
    }

    state.set(ListenerState::Notified);
    trace!("{listener} notified");
    state.set(ListenerState::RunningCallback);
    let result = callback(id);
    state.set(ListenerState::Done);
    Some(result)
}
