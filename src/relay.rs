//! Signal relay
//!
//! Physics reports contacts on the bodies involved, but the gag that cares
//! about a contact usually lives somewhere else (a tangerine gag watches the
//! can top, a bag gag watches the water). Listeners subscribe here to any
//! body's signals and the relay forwards them. No logic of its own.
//!
//! Body ids are never reused, so routes to destroyed bodies are left in place;
//! their final Exit contacts still need to reach the listeners.

use std::collections::BTreeMap;

use crate::gag::GagId;
use crate::gimmick::GimmickId;
use crate::sim::{BodyId, ContactEvent, ContactPhase};

/// Kinds of per-body signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    /// Contact enter/stay/exit with any other body
    Contact,
    /// The body was thrown (drag released)
    Release,
    /// The body was clicked
    Click,
}

/// Who receives a forwarded signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Listener {
    Gag(GagId),
    Gimmick(GimmickId),
}

/// A contact as seen from the subscribed body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactNotice {
    pub phase: ContactPhase,
    /// The body the listener subscribed to
    pub zone: BodyId,
    /// The body on the other side of the contact
    pub other: BodyId,
}

/// Body signal subscriptions
#[derive(Debug, Clone, Default)]
pub struct Relay {
    routes: BTreeMap<(BodyId, Signal), Vec<Listener>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to `signal` on `body` (idempotent)
    pub fn subscribe(&mut self, body: BodyId, signal: Signal, listener: Listener) {
        let listeners = self.routes.entry((body, signal)).or_default();
        if !listeners.contains(&listener) {
            listeners.push(listener);
        }
    }

    pub fn listeners(&self, body: BodyId, signal: Signal) -> &[Listener] {
        self.routes
            .get(&(body, signal))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Fan a contact out to the subscribers of both bodies
    pub fn route_contact(&self, event: &ContactEvent) -> Vec<(Listener, ContactNotice)> {
        let mut routed = Vec::new();
        for (zone, other) in [(event.a, event.b), (event.b, event.a)] {
            for &listener in self.listeners(zone, Signal::Contact) {
                routed.push((
                    listener,
                    ContactNotice {
                        phase: event.phase,
                        zone,
                        other,
                    },
                ));
            }
        }
        routed
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_to_both_sides() {
        let mut relay = Relay::new();
        relay.subscribe(3, Signal::Contact, Listener::Gag(0));
        relay.subscribe(7, Signal::Contact, Listener::Gimmick(1));
        relay.subscribe(7, Signal::Release, Listener::Gag(2));

        let event = ContactEvent {
            phase: ContactPhase::Enter,
            a: 3,
            b: 7,
        };
        let routed = relay.route_contact(&event);
        assert_eq!(routed.len(), 2);
        assert_eq!(routed[0].0, Listener::Gag(0));
        assert_eq!((routed[0].1.zone, routed[0].1.other), (3, 7));
        assert_eq!(routed[1].0, Listener::Gimmick(1));
        assert_eq!((routed[1].1.zone, routed[1].1.other), (7, 3));
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let mut relay = Relay::new();
        relay.subscribe(1, Signal::Click, Listener::Gag(4));
        relay.subscribe(1, Signal::Click, Listener::Gag(4));
        assert_eq!(relay.listeners(1, Signal::Click), &[Listener::Gag(4)]);
        assert!(relay.listeners(1, Signal::Release).is_empty());
    }

    #[test]
    fn test_unrelated_contact_is_dropped() {
        let mut relay = Relay::new();
        relay.subscribe(1, Signal::Contact, Listener::Gag(0));
        let event = ContactEvent {
            phase: ContactPhase::Stay,
            a: 5,
            b: 6,
        };
        assert!(relay.route_contact(&event).is_empty());
        assert!(!relay.is_empty());
        assert!(Relay::new().is_empty());
    }
}
