//! Complete broadcast sessions with a fixed number of listeners.

use rusty_broadcast::{BroadcastError, Broadcaster, scope};

/// Registers `listeners` owned listeners, fires and joins them. Returns each
/// listener's id as echoed by its callback.
pub fn fan_out(listeners: usize) -> Result<Vec<usize>, BroadcastError> {
    let mut events = Broadcaster::new();
    for id in 0..listeners {
        events.listen(id, |id| id)?;
    }
    events.trigger();
    events.wait()
}

/// Scoped variant of [`fan_out`]: every listener flags its own slot.
pub fn scoped_fan_out(slots: &mut [bool]) -> Result<(), BroadcastError> {
    scope(|events| {
        for (id, slot) in slots.iter_mut().enumerate() {
            events.listen(id, move |_| *slot = true)?;
        }
        events.trigger();
        Ok::<_, BroadcastError>(())
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_echoes_every_id() {
        assert_eq!(fan_out(6).unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert!(fan_out(0).unwrap().is_empty());
    }

    #[test]
    fn scoped_fan_out_flags_every_slot() {
        let mut slots = vec![false; 6];

        scoped_fan_out(&mut slots).unwrap();

        assert!(slots.iter().all(|flag| *flag));
    }
}
