//! Trigger-to-join latency of complete broadcast sessions.
//!
//! Registration cost grows with thread spawning and dominates a session, so
//! only the part after the last `listen` is timed: the broadcast and the
//! join barrier.

use std::time::{Duration, Instant};

use rusty_broadcast::{BroadcastError, Broadcaster};

/// Times `trigger` plus `wait` for one session of `listeners` listeners.
pub fn time_session(listeners: usize) -> Result<Duration, BroadcastError> {
    let mut events = Broadcaster::new();
    for id in 0..listeners {
        events.listen(id, |_| {})?;
    }

    let start = Instant::now();
    events.trigger();
    events.wait()?;
    Ok(start.elapsed())
}
