//! Event bus for broadcasting game notifications to passive listeners

use crate::event::GameEvent;
use ember_core::Result;

/// Identifies a subscription so it can be cancelled
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&GameEvent) -> Result<()>>;

/// Fire-and-forget fan-out of [`GameEvent`]s.
///
/// Listeners run in subscription order. A listener that returns an error is
/// logged and skipped; the remaining listeners still receive the event.
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    emitted: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
            emitted: 0,
        }
    }

    /// Register a listener for every event
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&GameEvent) -> Result<()> + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener
    pub fn emit(&mut self, event: &GameEvent) {
        self.emitted += 1;
        for (id, listener) in self.listeners.iter_mut() {
            if let Err(e) = listener(event) {
                log::error!("listener {:?} failed on '{}': {}", id, event.name(), e);
            }
        }
    }

    /// Number of subscribed listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Total events emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
