use std::env;
use std::error::Error;

use log::{LevelFilter, info};
use rusty_broadcast::{Broadcaster, Config, core::log::ChannelLogger};

const DEFAULT_LISTENERS: usize = 10;

/// Listener count from `RUSTY_LISTENERS`, falling back to the default when
/// unset or unparsable.
fn listener_count() -> usize {
  env::var("RUSTY_LISTENERS")
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(DEFAULT_LISTENERS)
}

fn main() -> Result<(), Box<dyn Error>> {
  let (logger, log_recv) = ChannelLogger::with_receiver(LevelFilter::Debug);
  let level = logger.level();
  log::set_boxed_logger(Box::new(logger))?;
  log::set_max_level(level);

  let count = listener_count();
  let mut events = Broadcaster::with_config(Config::new().with_thread_name_prefix("demo"));
  for id in 0..count {
    events.listen(id, |id| {
      info!("listener {id} notified");
      id * id
    })?;
  }

  events.trigger();
  let squares = events.wait()?;
  info!("all {} listeners finished", squares.len());

  for message in log_recv.try_iter() {
    println!("{} [{}] {}", message.level, message.target, message.message);
  }
  println!("squares: {:?}", squares);
  Ok(())
}
