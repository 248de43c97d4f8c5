//! World event source with explicit, per-subscriber mailboxes.

use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};

use crate::actors::{Actor, ActorId};

#[derive(Clone, Debug, PartialEq)]
pub enum ActorEvent {
    Appeared(Actor),
    Removed(ActorId),
    Died(ActorId),
}

/// Proof of a live subscription. Not clonable: handing it back through
/// [`WorldEventBus::unsubscribe`] is the only way to end it.
#[must_use]
#[derive(Debug, Eq, PartialEq)]
pub struct Subscription {
    id: u64,
}

/// Fan-out of actor events to subscribers. Events published while nobody is
/// subscribed are dropped; a subscriber only sees events published after it
/// subscribed and before it unsubscribed.
#[derive(Resource, Default)]
pub struct WorldEventBus {
    next_id: u64,
    mailboxes: HashMap<u64, VecDeque<ActorEvent>>,
}

impl WorldEventBus {
    pub fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        self.mailboxes.insert(self.next_id, VecDeque::new());
        Subscription { id: self.next_id }
    }

    /// Ends the subscription and discards anything still queued for it.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.mailboxes.remove(&subscription.id);
    }

    pub fn is_subscribed(&self, subscription: &Subscription) -> bool {
        self.mailboxes.contains_key(&subscription.id)
    }

    pub fn publish(&mut self, event: ActorEvent) {
        for mailbox in self.mailboxes.values_mut() {
            mailbox.push_back(event.clone());
        }
    }

    pub fn next_event(&mut self, subscription: &Subscription) -> Option<ActorEvent> {
        self.mailboxes.get_mut(&subscription.id)?.pop_front()
    }

    pub fn subscriber_count(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn pending(&self, subscription: &Subscription) -> usize {
        self.mailboxes.get(&subscription.id).map_or(0, VecDeque::len)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_before_subscribe_are_not_delivered() {
        let mut bus = WorldEventBus::default();
        bus.publish(ActorEvent::Died(ActorId(1)));

        let subscription = bus.subscribe();
        assert_eq!(bus.next_event(&subscription), None);

        bus.publish(ActorEvent::Removed(ActorId(2)));
        assert_eq!(
            bus.next_event(&subscription),
            Some(ActorEvent::Removed(ActorId(2)))
        );
    }

    #[test]
    fn every_subscriber_gets_its_own_copy() {
        let mut bus = WorldEventBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(ActorEvent::Died(ActorId(3)));

        assert_eq!(bus.next_event(&first), Some(ActorEvent::Died(ActorId(3))));
        assert_eq!(bus.next_event(&second), Some(ActorEvent::Died(ActorId(3))));
        assert_eq!(bus.next_event(&first), None);
    }

    #[test]
    fn unsubscribe_discards_queued_events() {
        let mut bus = WorldEventBus::default();
        let subscription = bus.subscribe();
        bus.publish(ActorEvent::Died(ActorId(1)));
        assert_eq!(bus.pending(&subscription), 1);

        let stale = Subscription {
            id: subscription.id,
        };
        bus.unsubscribe(subscription);

        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.is_subscribed(&stale));
        assert_eq!(bus.next_event(&stale), None);
    }
}
