//! One-shot event broadcasting across listener threads.
//!
//! A [`Broadcaster`] parks one thread per registered listener on a shared
//! gate, releases all of them with a single [`trigger`](Broadcaster::trigger)
//! and joins them again in [`wait`](Broadcaster::wait). Registration does not
//! return until the listener is provably parked, so a trigger issued right
//! after the last `listen` can never be lost.
//!
//! [`scope`] runs the same protocol on scoped threads, which lets callbacks
//! borrow state owned by the caller.
//!
//! ```rust,ignore
//! use rusty_broadcast::Broadcaster;
//!
//! let mut events = Broadcaster::new();
//! for id in 0..10 {
//!     events.listen(id, |id| id * 2)?;
//! }
//! events.trigger();
//! let doubled = events.wait()?;
//! ```

pub mod core;
pub mod event;

pub use crate::core::{config::Config, error::BroadcastError};
pub use event::{
    Broadcaster, ListenerId, ListenerState, ScopedBroadcaster, scope, scope_with_config,
};
