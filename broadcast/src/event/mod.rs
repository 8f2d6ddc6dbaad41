pub mod broadcaster;
pub mod scope;

mod gate;
mod listener;
mod signal;

pub use broadcaster::Broadcaster;
pub use listener::{ListenerId, ListenerState};
pub use scope::{ScopedBroadcaster, scope, scope_with_config};
