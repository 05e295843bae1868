//! Gag trigger state machine
//!
//! `Idle -> Armed (accumulating) -> Fired`. A gag only observes; side effects
//! of firing (pun request, fade, item fate) are carried out by the stage from
//! the returned `GagEvent`s.

use std::collections::BTreeSet;

use serde::Serialize;

use super::config::{Condition, GagConfig, Rearm};
use crate::interaction::ReleaseEvent;
use crate::relay::{ContactNotice, Signal};
use crate::sim::{BodyId, ContactPhase, PhysicsWorld};
use crate::tilt_from_upright;

/// Stable gag identifier (index in the stage)
pub type GagId = u32;

/// Slack for hold times built from summed fixed steps
const HOLD_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GagPhase {
    #[default]
    Idle,
    /// Condition is being met; `elapsed` seconds held so far
    Armed { elapsed: f32 },
    Fired,
}

/// Visual stage of a click-counting gag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickStage {
    /// Below half of the required clicks
    Started,
    /// Half or more
    Halfway,
    Complete,
}

impl ClickStage {
    pub fn from_progress(clicks: u32, required: u32) -> Self {
        if clicks >= required {
            ClickStage::Complete
        } else if clicks * 2 >= required {
            ClickStage::Halfway
        } else {
            ClickStage::Started
        }
    }
}

/// Something the stage has to act on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GagEvent {
    Fired,
    Progress(ClickStage),
    /// A dragged item is held over the receiver
    HoverStart { item: BodyId },
    HoverEnd { item: BodyId },
    Rearmed,
}

#[derive(Debug, Clone)]
pub struct Gag {
    pub id: GagId,
    pub config: GagConfig,
    phase: GagPhase,
    clicks: u32,
    /// Ground contacts of the subject (tilt) or whether the target is in the
    /// zone (dwell, as a one-element set)
    touching: BTreeSet<BodyId>,
    hovering: bool,
}

impl Gag {
    pub fn new(id: GagId, config: GagConfig) -> Self {
        Self {
            id,
            config,
            phase: GagPhase::Idle,
            clicks: 0,
            touching: BTreeSet::new(),
            hovering: false,
        }
    }

    pub fn phase(&self) -> GagPhase {
        self.phase
    }

    pub fn has_fired(&self) -> bool {
        self.phase == GagPhase::Fired
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Held time so far (0 unless armed)
    pub fn elapsed(&self) -> f32 {
        match self.phase {
            GagPhase::Armed { elapsed } => elapsed,
            _ => 0.0,
        }
    }

    /// Body signals this gag needs forwarded
    pub fn subscriptions(&self) -> Vec<(BodyId, Signal)> {
        let subject = self.config.subject;
        let mut subs = match &self.config.condition {
            Condition::ReleaseSpeed { .. } | Condition::ReleaseHeight { .. } => {
                vec![(subject, Signal::Release)]
            }
            Condition::Clicks { .. } => vec![(subject, Signal::Click)],
            Condition::Dwell { zone, .. } => vec![(*zone, Signal::Contact)],
            Condition::Tilted { .. } => vec![(subject, Signal::Contact)],
            Condition::AngleWindow { .. } => Vec::new(),
            Condition::Give { receiver, .. } => vec![(*receiver, Signal::Contact)],
        };
        if self.config.rearm == Rearm::OnRelease && !subs.contains(&(subject, Signal::Release)) {
            subs.push((subject, Signal::Release));
        }
        subs
    }

    fn fire(&mut self, events: &mut Vec<GagEvent>) {
        self.phase = GagPhase::Fired;
        log::info!("Gag '{}' fired (pun {})", self.config.name, self.config.pun_id);
        events.push(GagEvent::Fired);
    }

    fn rearm_if(&mut self, rearm: Rearm, events: &mut Vec<GagEvent>) {
        if self.phase == GagPhase::Fired && self.config.rearm == rearm {
            self.phase = GagPhase::Idle;
            self.clicks = 0;
            log::debug!("Gag '{}' re-armed", self.config.name);
            events.push(GagEvent::Rearmed);
        }
    }

    /// Condition lost: drop accumulated time (or re-arm a fired gag)
    fn lose_condition(&mut self, events: &mut Vec<GagEvent>) {
        match self.phase {
            GagPhase::Armed { .. } => self.phase = GagPhase::Idle,
            GagPhase::Fired => self.rearm_if(Rearm::OnContactLoss, events),
            GagPhase::Idle => {}
        }
    }

    /// Accumulate hold time while the condition holds
    fn hold(&mut self, dt: f32, hold_secs: f32, events: &mut Vec<GagEvent>) {
        let elapsed = match self.phase {
            GagPhase::Fired => return,
            GagPhase::Idle => dt,
            GagPhase::Armed { elapsed } => elapsed + dt,
        };
        if elapsed + HOLD_EPSILON >= hold_secs {
            self.fire(events);
        } else {
            self.phase = GagPhase::Armed { elapsed };
        }
    }

    /// The subject (or another watched body) was thrown
    pub fn on_release(&mut self, release: &ReleaseEvent, world: &impl PhysicsWorld) -> Vec<GagEvent> {
        let mut events = Vec::new();
        if release.body != self.config.subject {
            return events;
        }
        self.rearm_if(Rearm::OnRelease, &mut events);
        if self.has_fired() {
            return events;
        }

        let met = match &self.config.condition {
            Condition::ReleaseSpeed { min_speed } => release.velocity.length() >= *min_speed,
            Condition::ReleaseHeight { min_y } => world.body(release.body).is_some_and(|b| b.pos.y >= *min_y),
            _ => false,
        };
        if met {
            self.fire(&mut events);
        }
        events
    }

    pub fn on_click(&mut self, body: BodyId) -> Vec<GagEvent> {
        let mut events = Vec::new();
        let Condition::Clicks { required } = self.config.condition else {
            return events;
        };
        if body != self.config.subject || self.has_fired() {
            return events;
        }

        let before = ClickStage::from_progress(self.clicks, required);
        self.clicks += 1;
        let after = ClickStage::from_progress(self.clicks, required);
        if self.clicks == 1 || after != before {
            events.push(GagEvent::Progress(after));
        }
        if after == ClickStage::Complete {
            self.fire(&mut events);
        } else {
            self.phase = GagPhase::Armed { elapsed: 0.0 };
        }
        events
    }

    /// A contact on a subscribed body
    ///
    /// `dragging` is the body currently held by the pointer.
    pub fn on_contact(
        &mut self,
        notice: ContactNotice,
        world: &impl PhysicsWorld,
        dragging: Option<BodyId>,
    ) -> Vec<GagEvent> {
        let mut events = Vec::new();
        match &self.config.condition {
            Condition::Dwell { zone, target, .. } => {
                if notice.zone != *zone || notice.other != *target {
                    return events;
                }
                match notice.phase {
                    ContactPhase::Enter | ContactPhase::Stay => {
                        if notice.phase == ContactPhase::Enter && !self.has_fired() {
                            self.phase = GagPhase::Armed { elapsed: 0.0 };
                        }
                        self.touching.insert(notice.other);
                    }
                    ContactPhase::Exit => {
                        self.touching.remove(&notice.other);
                        self.lose_condition(&mut events);
                    }
                }
            }
            Condition::Tilted { ground_tag, .. } => {
                if notice.zone != self.config.subject {
                    return events;
                }
                match notice.phase {
                    ContactPhase::Enter | ContactPhase::Stay => {
                        let is_ground = world.body(notice.other).is_some_and(|b| b.has_tag(ground_tag));
                        if !is_ground {
                            return events;
                        }
                        self.touching.insert(notice.other);
                        // A fresh landing restarts the hold
                        if notice.phase == ContactPhase::Enter && matches!(self.phase, GagPhase::Armed { .. }) {
                            self.phase = GagPhase::Idle;
                        }
                    }
                    ContactPhase::Exit => {
                        // The other body may be gone already, so no tag check
                        if self.touching.remove(&notice.other) && self.touching.is_empty() {
                            self.lose_condition(&mut events);
                        }
                    }
                }
            }
            Condition::Give { receiver, item, .. } => {
                let item = *item;
                if notice.zone != *receiver || notice.other != item || self.has_fired() {
                    return events;
                }
                let dragged = dragging == Some(item);
                match notice.phase {
                    ContactPhase::Enter => {
                        if !dragged {
                            self.fire(&mut events);
                        }
                    }
                    ContactPhase::Stay => {
                        if dragged && !self.hovering {
                            self.hovering = true;
                            events.push(GagEvent::HoverStart { item });
                        } else if !dragged && self.hovering {
                            self.hovering = false;
                            events.push(GagEvent::HoverEnd { item });
                            self.fire(&mut events);
                        }
                    }
                    ContactPhase::Exit => {
                        if self.hovering {
                            self.hovering = false;
                            events.push(GagEvent::HoverEnd { item });
                        }
                    }
                }
            }
            _ => {}
        }
        events
    }

    /// Per-step update of the time-based conditions
    pub fn update(&mut self, dt: f32, world: &impl PhysicsWorld) -> Vec<GagEvent> {
        let mut events = Vec::new();
        match self.config.condition {
            Condition::Dwell { hold_secs, .. } => {
                if !self.touching.is_empty() {
                    self.hold(dt, hold_secs, &mut events);
                }
            }
            Condition::Tilted {
                min_tilt_deg,
                hold_secs,
                ..
            } => {
                let Some(subject) = world.body(self.config.subject) else {
                    return events;
                };
                if self.touching.is_empty() {
                    return events;
                }
                if tilt_from_upright(subject.rotation_degrees()) >= min_tilt_deg {
                    self.hold(dt, hold_secs, &mut events);
                } else if matches!(self.phase, GagPhase::Armed { .. }) {
                    self.phase = GagPhase::Idle;
                }
            }
            Condition::AngleWindow {
                min_deg,
                max_deg,
                hold_secs,
            } => {
                let Some(subject) = world.body(self.config.subject) else {
                    return events;
                };
                let angle = subject.rotation_degrees();
                if (min_deg..=max_deg).contains(&angle) {
                    self.hold(dt, hold_secs, &mut events);
                } else {
                    self.lose_condition(&mut events);
                }
            }
            _ => {}
        }
        events
    }
}
