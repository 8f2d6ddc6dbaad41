use std::thread::{JoinHandle, Scope, ScopedJoinHandle};

use super::{config::Config, error::BroadcastError};
use crate::event::ListenerId;

/// Thread owned by a single listener. Unlike a pool worker it runs exactly
/// one unit of work and is joined exactly once.
pub(crate) struct ListenerThread<T> {
    listener: ListenerId,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> ListenerThread<T> {
    /// Spawn the listener's thread with the configured name and stack size.
    pub(crate) fn spawn<W>(
        config: &Config,
        listener: ListenerId,
        work: W,
    ) -> Result<Self, BroadcastError>
    where
        W: FnOnce() -> T + Send + 'static,
    {
        let handle = config
            .builder(listener)
            .spawn(work)
            .map_err(|source| BroadcastError::Spawn { listener, source })?;
        Ok(Self { listener, handle })
    }
}

impl<T> ListenerThread<T> {
    /// Join the calling thread to the listener thread.
    pub(crate) fn join(self) -> Result<T, BroadcastError> {
        let listener = self.listener;
        self.handle
            .join()
            .map_err(|_| BroadcastError::ListenerPanicked { listener })
    }
}

/// Scoped counterpart of [`ListenerThread`], allowed to borrow from `'scope`.
pub(crate) struct ScopedListenerThread<'scope, T> {
    listener: ListenerId,
    handle: ScopedJoinHandle<'scope, T>,
}

impl<'scope, T: Send + 'scope> ScopedListenerThread<'scope, T> {
    pub(crate) fn spawn<'env, W>(
        scope: &'scope Scope<'scope, 'env>,
        config: &Config,
        listener: ListenerId,
        work: W,
    ) -> Result<Self, BroadcastError>
    where
        W: FnOnce() -> T + Send + 'scope,
    {
        let handle = config
            .builder(listener)
            .spawn_scoped(scope, work)
            .map_err(|source| BroadcastError::Spawn { listener, source })?;
        Ok(Self { listener, handle })
    }
}

impl<'scope, T> ScopedListenerThread<'scope, T> {
    pub(crate) fn join(self) -> Result<T, BroadcastError> {
        let listener = self.listener;
        self.handle
            .join()
            .map_err(|_| BroadcastError::ListenerPanicked { listener })
    }
}
