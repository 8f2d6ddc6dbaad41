pub mod config;
pub mod error;
pub mod log;
pub(crate) mod thread;

pub use config::Config;
pub use error::BroadcastError;
