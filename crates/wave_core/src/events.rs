//! Notifications for presentation layers.
//!
//! Events are delivered synchronously to subscribers as they are published
//! and also buffered until [`EventBus::drain`] is called, so a host can use
//! either style.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Something a HUD or audio layer may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveEvent {
    /// A new wave started.
    WaveChanged {
        /// Wave number.
        wave: u32,
    },
    /// Whole seconds left before the next wave. Zero hides the countdown.
    CountdownTick {
        /// Seconds remaining, rounded up.
        seconds_remaining: u32,
    },
    /// Number of hostiles in play changed.
    PopulationChanged {
        /// Hostiles in the live set.
        living: usize,
    },
}

type Subscriber = Box<dyn FnMut(&WaveEvent)>;

/// Publish/subscribe channel for [`WaveEvent`]s.
#[derive(Default)]
pub struct EventBus {
    queue: Vec<WaveEvent>,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("queue", &self.queue)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    /// Empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every subsequent event.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&WaveEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Deliver `event` to subscribers and buffer it.
    pub fn publish(&mut self, event: WaveEvent) {
        debug!(?event, "publish");
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.queue.push(event);
    }

    /// Events published since the last drain.
    #[must_use]
    pub fn pending(&self) -> &[WaveEvent] {
        &self.queue
    }

    /// Take all buffered events.
    pub fn drain(&mut self) -> Vec<WaveEvent> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribers_see_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut bus = EventBus::new();
        bus.subscribe(move |event| sink.borrow_mut().push(*event));

        bus.publish(WaveEvent::WaveChanged { wave: 1 });
        bus.publish(WaveEvent::PopulationChanged { living: 7 });

        assert_eq!(
            *seen.borrow(),
            vec![
                WaveEvent::WaveChanged { wave: 1 },
                WaveEvent::PopulationChanged { living: 7 },
            ]
        );
    }

    #[test]
    fn test_drain_empties_buffer() {
        let mut bus = EventBus::new();
        bus.publish(WaveEvent::CountdownTick {
            seconds_remaining: 5,
        });
        assert_eq!(bus.pending().len(), 1);
        assert_eq!(bus.drain().len(), 1);
        assert!(bus.pending().is_empty());
    }
}
