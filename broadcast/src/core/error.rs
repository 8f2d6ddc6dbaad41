use std::io;

use crate::event::ListenerId;

/// Errors reported by a broadcast session.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// The OS refused to start a listener thread. The session is dismissed.
    #[error("Failed to spawn thread for {listener}: {source}")]
    Spawn {
        listener: ListenerId,
        #[source]
        source: io::Error,
    },

    /// The listener thread exited before it started waiting on the gate.
    #[error("{listener} exited before it started waiting")]
    ListenerLost { listener: ListenerId },

    /// The listener's callback panicked.
    #[error("Callback of {listener} panicked")]
    ListenerPanicked { listener: ListenerId },

    #[error("Broadcast already triggered")]
    AlreadyTriggered,

    #[error("Broadcast session was dismissed")]
    Dismissed,
}

impl BroadcastError {
    /// The listener this error concerns, if it concerns a single one.
    pub fn listener(&self) -> Option<ListenerId> {
        match self {
            Self::Spawn { listener, .. }
            | Self::ListenerLost { listener }
            | Self::ListenerPanicked { listener } => Some(*listener),
            Self::AlreadyTriggered | Self::Dismissed => None,
        }
    }
}
