//! Drag-and-throw interaction manager
//!
//! Press grabs the topmost dynamic body under the pointer, every fixed step
//! the body chases the pointer, release throws it with the pointer's velocity.
//! Exactly one body can be held at a time.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::cross;
use crate::sim::{BodyId, PhysicsWorld};

/// Drag and throw tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Maximum speed a held body may chase the pointer at (None = unlimited)
    pub max_drag_speed: Option<f32>,
    /// Scale from release velocity to throw impulse
    pub force_multiplier: f32,
    /// Scale applied to the release torque
    pub torque_multiplier: f32,
    /// Cap on release velocity magnitude (None = unlimited)
    pub max_throw_speed: Option<f32>,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            max_drag_speed: Some(30.0),
            force_multiplier: 1.0,
            torque_multiplier: 0.5,
            max_throw_speed: Some(80.0),
        }
    }
}

/// The currently held body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub body: BodyId,
    /// Body center minus pointer at grab time
    pub offset: Vec2,
    /// Pointer position at the previous fixed step
    pub prev_pointer: Vec2,
}

/// A completed throw, handed once to the body's release listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseEvent {
    pub body: BodyId,
    pub velocity: Vec2,
    /// Simulation time of the release (seconds)
    pub time: f64,
}

/// Why a grab did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabRefused {
    /// Something is already being dragged
    SessionActive,
    /// A UI element covers the pointer
    OverUi,
    /// No dynamic body under the pointer
    NothingUnderPointer,
    /// The body under the pointer was pinned by a gag
    Locked,
}

/// Owns the (single) drag session
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    pub tuning: DragTuning,
    session: Option<DragSession>,
    locked: BTreeSet<BodyId>,
}

impl InteractionManager {
    pub fn new(tuning: DragTuning) -> Self {
        Self {
            tuning,
            session: None,
            locked: BTreeSet::new(),
        }
    }

    /// Try to grab the body under the pointer
    pub fn begin_drag(
        &mut self,
        world: &impl PhysicsWorld,
        pointer: Vec2,
        over_ui: bool,
    ) -> Result<BodyId, GrabRefused> {
        if self.session.is_some() {
            return Err(GrabRefused::SessionActive);
        }
        if over_ui {
            return Err(GrabRefused::OverUi);
        }

        let body = world
            .pick(pointer)
            .and_then(|id| world.body(id))
            .ok_or(GrabRefused::NothingUnderPointer)?;
        if self.locked.contains(&body.id) {
            return Err(GrabRefused::Locked);
        }

        self.session = Some(DragSession {
            body: body.id,
            offset: body.pos - pointer,
            prev_pointer: pointer,
        });
        log::debug!("Grabbed body {} ({})", body.id, body.name);
        Ok(body.id)
    }

    /// Chase the pointer for one fixed step
    pub fn update_drag(&mut self, world: &mut impl PhysicsWorld, pointer: Vec2, dt: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(current) = world.body(session.body).map(|b| b.pos) else {
            log::debug!("Dragged body {} vanished, dropping session", session.body);
            self.session = None;
            return;
        };

        let mut step = pointer + session.offset - current;
        if let Some(max_speed) = self.tuning.max_drag_speed {
            step = step.clamp_length_max(max_speed * dt);
        }
        world.move_position(session.body, current + step);
        session.prev_pointer = pointer;
    }

    /// Let go: throw the body with the pointer's velocity
    ///
    /// Returns `None` when nothing was held or the held body is gone.
    pub fn end_drag(
        &mut self,
        world: &mut impl PhysicsWorld,
        pointer: Vec2,
        dt: f32,
        time: f64,
    ) -> Option<ReleaseEvent> {
        let session = self.session.take()?;
        let center = world.body(session.body)?.pos;

        let velocity = self.release_velocity(session.prev_pointer, pointer, dt);
        let torque = cross(pointer - center, velocity) * self.tuning.torque_multiplier;

        world.apply_impulse_at(session.body, velocity * self.tuning.force_multiplier, pointer);
        world.apply_torque_impulse(session.body, torque);

        Some(ReleaseEvent {
            body: session.body,
            velocity,
            time,
        })
    }

    /// Pointer velocity over one fixed step, capped at `max_throw_speed`
    pub fn release_velocity(&self, prev_pointer: Vec2, pointer: Vec2, dt: f32) -> Vec2 {
        if dt <= 0.0 {
            return Vec2::ZERO;
        }
        let velocity = (pointer - prev_pointer) / dt;
        match self.tuning.max_throw_speed {
            Some(max_speed) => velocity.clamp_length_max(max_speed.max(0.0)),
            None => velocity,
        }
    }

    /// Drop the session without throwing (teardown, result screen)
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// End the session if its body no longer exists
    pub fn drop_if_missing(&mut self, world: &impl PhysicsWorld) {
        if let Some(session) = self.session
            && !world.exists(session.body)
        {
            log::debug!("Dragged body {} destroyed mid-drag", session.body);
            self.session = None;
        }
    }

    pub fn is_dragging(&self, body: BodyId) -> bool {
        self.session.is_some_and(|s| s.body == body)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn dragged_body(&self) -> Option<BodyId> {
        self.session.map(|s| s.body)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Refuse all future grabs of `body`
    pub fn lock(&mut self, body: BodyId) {
        self.locked.insert(body);
        if self.is_dragging(body) {
            self.session = None;
        }
    }

    pub fn is_locked(&self, body: BodyId) -> bool {
        self.locked.contains(&body)
    }
}
