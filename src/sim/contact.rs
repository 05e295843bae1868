//! Contact tracking
//!
//! The world reports which pairs touch each step; the tracker turns that into
//! enter/stay/exit transitions the way trigger callbacks arrive in an engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::body::BodyId;

/// Contact transition for a pair of bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    Enter,
    Stay,
    Exit,
}

/// A contact transition between two bodies (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyId,
    pub b: BodyId,
}

impl ContactEvent {
    /// The other side of the pair, if `body` is part of it
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Canonical (ordered) pair key
#[inline]
pub fn pair(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Remembers last step's touching pairs
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    active: BTreeSet<(BodyId, BodyId)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff this step's touching pairs against the previous step
    ///
    /// Exits come first, then enters/stays, each in pair order.
    pub fn update(&mut self, touching: BTreeSet<(BodyId, BodyId)>) -> Vec<ContactEvent> {
        let mut events: Vec<ContactEvent> = self
            .active
            .difference(&touching)
            .map(|&(a, b)| ContactEvent {
                phase: ContactPhase::Exit,
                a,
                b,
            })
            .collect();

        events.extend(touching.iter().map(|&(a, b)| ContactEvent {
            phase: if self.active.contains(&(a, b)) {
                ContactPhase::Stay
            } else {
                ContactPhase::Enter
            },
            a,
            b,
        }));

        self.active = touching;
        events
    }

    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.active.contains(&pair(a, b))
    }

    /// Number of pairs currently touching
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
