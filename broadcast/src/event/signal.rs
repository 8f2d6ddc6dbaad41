use crossbeam::channel::{Receiver, Sender, bounded};

/// Creates the single-use rendezvous a listener uses to report that it is
/// parked on the gate.
pub(crate) fn ready() -> (Ready, Started) {
    let (tx, rx) = bounded(1);
    (Ready { sender: tx }, Started { receiver: rx })
}

/// Listener side of the handshake. Consumed when signalled.
pub(crate) struct Ready {
    sender: Sender<()>,
}

impl Ready {
    pub(crate) fn signal(self) {
        // Capacity one and a single send: this cannot block. A closed
        // receiver only means the registering side already gave up.
        let _ = self.sender.send(());
    }
}

/// Registering side of the handshake.
pub(crate) struct Started {
    receiver: Receiver<()>,
}

impl Started {
    /// Blocks until the listener signals. Returns `false` if the listener
    /// went away without signalling.
    pub(crate) fn wait(self) -> bool {
        self.receiver.recv().is_ok()
    }
}
