use std::thread;

use crate::event::ListenerId;

/// Thread settings applied to every listener a broadcaster spawns.
///
/// Listener threads are named `"{prefix}-{token}"` so they can be told apart
/// in debuggers and panic messages.
///
/// ```rust,ignore
/// let config = Config::new()
///     .with_thread_name_prefix("reload")
///     .with_stack_size(64 * 1024);
/// let events = Broadcaster::<usize>::with_config(config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    thread_name_prefix: String,
    stack_size: Option<usize>,
}

impl Config {
    /// Creates the default configuration: prefix `"listener"` and the
    /// platform's default stack size.
    pub fn new() -> Self {
        Self {
            thread_name_prefix: String::from("listener"),
            stack_size: None,
        }
    }

    /// Sets the prefix used when naming listener threads.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the stack size, in bytes, of every listener thread.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "Listener stack size must be greater than 0");
        self.stack_size = Some(bytes);
        self
    }

    pub fn thread_name_prefix(&self) -> &str {
        &self.thread_name_prefix
    }

    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    pub(crate) fn thread_name(&self, listener: ListenerId) -> String {
        format!("{}-{}", self.thread_name_prefix, listener.index())
    }

    /// Thread builder for one listener.
    pub(crate) fn builder(&self, listener: ListenerId) -> thread::Builder {
        let builder = thread::Builder::new().name(self.thread_name(listener));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_listener_prefix() {
        let config = Config::default();

        assert_eq!(config.thread_name_prefix(), "listener");
        assert_eq!(config.stack_size(), None);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = Config::new()
            .with_thread_name_prefix("reload")
            .with_stack_size(128 * 1024);

        assert_eq!(config.thread_name_prefix(), "reload");
        assert_eq!(config.stack_size(), Some(128 * 1024));
    }

    #[test]
    fn thread_name_includes_token() {
        let config = Config::new().with_thread_name_prefix("demo");
        let listener = ListenerId::next();

        assert_eq!(
            config.thread_name(listener),
            format!("demo-{}", listener.index())
        );
    }

    #[test]
    #[should_panic(expected = "stack size must be greater than 0")]
    fn zero_stack_size_panics() {
        let _ = Config::new().with_stack_size(0);
    }
}
