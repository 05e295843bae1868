//! Physics boundary and the reference world
//!
//! Gameplay code only talks to `PhysicsWorld`. `World` is a small deterministic
//! implementation good enough to run scenes headless and in the browser:
//! - Fixed timestep only
//! - Bodies kept sorted by id, iteration in id order
//! - Only dynamic-vs-static pairs collide; every touching pair is reported

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodyKind};
use super::collision::{aabb_collision, aabb_overlap, resolve_velocity};
use super::contact::{ContactEvent, ContactTracker};
use crate::consts::GRAVITY;
use crate::cross;

/// Extra margin so resting bodies keep reporting contact
pub const CONTACT_SKIN: f32 = 0.02;

/// The physics engine as seen by gameplay code
///
/// All mutators return `false` when the body does not exist (or ignores the
/// operation); callers treat that as a no-op.
pub trait PhysicsWorld {
    fn body(&self, id: BodyId) -> Option<&Body>;

    fn exists(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }

    /// Topmost dynamic, non-sensor body under `point`
    fn pick(&self, point: Vec2) -> Option<BodyId>;

    /// Topmost non-sensor body of any kind under `point`
    fn hit_test(&self, point: Vec2) -> Option<BodyId>;

    /// Whether two bodies currently overlap
    fn overlaps(&self, a: BodyId, b: BodyId) -> bool;

    /// Move a body to `target` during the next step, keeping it simulated
    fn move_position(&mut self, id: BodyId, target: Vec2) -> bool;

    /// Instant change in momentum applied at a world point
    fn apply_impulse_at(&mut self, id: BodyId, impulse: Vec2, point: Vec2) -> bool;

    /// Instant change in angular momentum
    fn apply_torque_impulse(&mut self, id: BodyId, torque: f32) -> bool;

    /// Continuous force for the next step
    fn add_force(&mut self, id: BodyId, force: Vec2) -> bool;

    fn set_velocity(&mut self, id: BodyId, vel: Vec2, angular_vel: f32) -> bool;

    fn set_position(&mut self, id: BodyId, pos: Vec2) -> bool;

    fn set_mass(&mut self, id: BodyId, mass: f32) -> bool;

    fn destroy(&mut self, id: BodyId) -> bool;

    /// Advance one fixed step and report contact transitions
    fn step(&mut self, dt: f32) -> Vec<ContactEvent>;
}

/// Reference world tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub gravity: Vec2,
    /// Bounce factor against static solids (0 = dead stop)
    pub restitution: f32,
    /// Fraction of tangential velocity lost per contact step
    pub friction: f32,
    /// Linear damping (1/s)
    pub linear_damping: f32,
    /// Angular damping (1/s)
    pub angular_damping: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, GRAVITY),
            restitution: 0.2,
            friction: 0.1,
            linear_damping: 0.0,
            angular_damping: 0.5,
        }
    }
}

/// Deterministic box world
#[derive(Debug, Clone, Default)]
pub struct World {
    pub tuning: WorldTuning,
    /// Bodies sorted by id
    bodies: Vec<Body>,
    contacts: ContactTracker,
    next_id: BodyId,
}

impl World {
    pub fn new(tuning: WorldTuning) -> Self {
        Self {
            tuning,
            bodies: Vec::new(),
            contacts: ContactTracker::new(),
            next_id: 1,
        }
    }

    /// Add a body, returning its freshly allocated id
    pub fn spawn(&mut self, mut body: Body) -> BodyId {
        let id = self.next_entity_id();
        body.id = id;
        self.bodies.push(body);
        id
    }

    fn next_entity_id(&mut self) -> BodyId {
        // `Default` leaves next_id at 0; ids start at 1
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Look up a body id by scene name
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().find(|b| b.name == name).map(|b| b.id)
    }

    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.contacts.is_touching(a, b)
    }

    fn index(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let index = self.index(id)?;
        self.bodies.get_mut(index)
    }

    fn topmost(&self, point: Vec2, filter: impl Fn(&Body) -> bool) -> Option<BodyId> {
        self.bodies
            .iter()
            .filter(|b| !b.sensor && filter(b) && b.contains(point))
            .max_by_key(|b| (b.layer, b.id))
            .map(|b| b.id)
    }

    fn integrate(&mut self, dt: f32) {
        let tuning = &self.tuning;
        let linear_decay = 1.0 / (1.0 + dt * tuning.linear_damping);
        let angular_decay = 1.0 / (1.0 + dt * tuning.angular_damping);

        for body in &mut self.bodies {
            match body.kind {
                BodyKind::Static => {}
                BodyKind::Kinematic => {
                    body.pos += body.vel * dt;
                    body.rotation += body.angular_vel * dt;
                }
                BodyKind::Dynamic => {
                    if let Some(target) = body.move_target.take() {
                        // Pointer-driven: follow the target exactly, forget
                        // accumulated fall speed so a release starts clean
                        body.pos = target;
                        body.vel = Vec2::ZERO;
                    } else {
                        let accel = tuning.gravity + body.force / body.mass.max(f32::EPSILON);
                        body.vel = (body.vel + accel * dt) * linear_decay;
                        body.pos += body.vel * dt;
                    }
                    body.angular_vel *= angular_decay;
                    body.rotation += body.angular_vel * dt;
                }
            }
            body.force = Vec2::ZERO;
        }
    }

    fn resolve_static_collisions(&mut self) {
        let solids: Vec<(Vec2, Vec2)> = self
            .bodies
            .iter()
            .filter(|b| b.kind == BodyKind::Static && !b.sensor)
            .map(|b| (b.pos, b.half_extents))
            .collect();
        let restitution = self.tuning.restitution;
        let friction = self.tuning.friction;

        for body in self.bodies.iter_mut().filter(|b| b.is_dynamic() && !b.sensor) {
            for &(solid_pos, solid_half) in &solids {
                let result = aabb_collision(body.pos, body.half_extents, solid_pos, solid_half);
                if result.hit {
                    body.pos += result.normal * result.penetration;
                    body.vel = resolve_velocity(body.vel, result.normal, restitution, friction);
                }
            }
        }
    }

    fn touching_pairs(&self) -> BTreeSet<(BodyId, BodyId)> {
        let skin = Vec2::splat(CONTACT_SKIN);
        let mut touching = BTreeSet::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                if a.kind == BodyKind::Static && b.kind == BodyKind::Static {
                    continue;
                }
                if aabb_overlap(a.pos, a.half_extents + skin, b.pos, b.half_extents + skin) {
                    // Bodies are sorted, so a.id < b.id
                    touching.insert((a.id, b.id));
                }
            }
        }
        touching
    }
}

impl PhysicsWorld for World {
    fn body(&self, id: BodyId) -> Option<&Body> {
        self.index(id).map(|i| &self.bodies[i])
    }

    fn pick(&self, point: Vec2) -> Option<BodyId> {
        self.topmost(point, Body::is_dynamic)
    }

    fn hit_test(&self, point: Vec2) -> Option<BodyId> {
        self.topmost(point, |_| true)
    }

    fn overlaps(&self, a: BodyId, b: BodyId) -> bool {
        match (self.body(a), self.body(b)) {
            (Some(a), Some(b)) => aabb_overlap(a.pos, a.half_extents, b.pos, b.half_extents),
            _ => false,
        }
    }

    fn move_position(&mut self, id: BodyId, target: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) if body.kind != BodyKind::Static => {
                body.move_target = Some(target);
                true
            }
            _ => false,
        }
    }

    fn apply_impulse_at(&mut self, id: BodyId, impulse: Vec2, point: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) if body.is_dynamic() && body.mass > 0.0 => {
                body.vel += impulse / body.mass;
                let inertia = body.inertia();
                if inertia > 0.0 {
                    body.angular_vel += cross(point - body.pos, impulse) / inertia;
                }
                true
            }
            _ => false,
        }
    }

    fn apply_torque_impulse(&mut self, id: BodyId, torque: f32) -> bool {
        match self.body_mut(id) {
            Some(body) if body.is_dynamic() && body.inertia() > 0.0 => {
                body.angular_vel += torque / body.inertia();
                true
            }
            _ => false,
        }
    }

    fn add_force(&mut self, id: BodyId, force: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) if body.is_dynamic() => {
                body.force += force;
                true
            }
            _ => false,
        }
    }

    fn set_velocity(&mut self, id: BodyId, vel: Vec2, angular_vel: f32) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.vel = vel;
                body.angular_vel = angular_vel;
                true
            }
            None => false,
        }
    }

    fn set_position(&mut self, id: BodyId, pos: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.pos = pos;
                true
            }
            None => false,
        }
    }

    fn set_mass(&mut self, id: BodyId, mass: f32) -> bool {
        match self.body_mut(id) {
            Some(body) if mass > 0.0 => {
                body.mass = mass;
                true
            }
            _ => false,
        }
    }

    fn destroy(&mut self, id: BodyId) -> bool {
        match self.index(id) {
            Some(index) => {
                let body = self.bodies.remove(index);
                log::debug!("Destroyed body {} ({})", body.id, body.name);
                true
            }
            None => false,
        }
    }

    fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        self.integrate(dt);
        self.resolve_static_collisions();
        let touching = self.touching_pairs();
        self.contacts.update(touching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::ContactPhase;

    fn floor() -> Body {
        Body::new("floor", BodyKind::Static, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0)).with_tag("Ground")
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut world = World::new(WorldTuning::default());
        let a = world.spawn(floor());
        let b = world.spawn(Body::new("box", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE));
        assert_eq!((a, b), (1, 2));
        assert_eq!(world.find("box"), Some(2));
        assert_eq!(world.find("missing"), None);
    }

    #[test]
    fn test_body_falls_and_rests_on_floor() {
        let mut world = World::new(WorldTuning::default());
        let floor_id = world.spawn(floor());
        let id = world.spawn(Body::new("box", BodyKind::Dynamic, Vec2::new(0.0, 3.0), Vec2::splat(0.5)));

        let mut entered = false;
        for _ in 0..300 {
            for event in world.step(SIM_DT) {
                if event.phase == ContactPhase::Enter && event.other(id) == Some(floor_id) {
                    entered = true;
                }
            }
        }

        let body = world.body(id).unwrap();
        assert!(entered);
        assert!((body.pos.y - 0.5).abs() < 0.05, "resting y = {}", body.pos.y);
        assert!(world.is_touching(id, floor_id));
    }

    #[test]
    fn test_pick_prefers_top_layer_and_skips_static() {
        let mut world = World::new(WorldTuning::default());
        world.spawn(Body::new("wall", BodyKind::Static, Vec2::ZERO, Vec2::splat(5.0)).with_layer(9));
        let low = world.spawn(Body::new("low", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE));
        let high = world.spawn(Body::new("high", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE).with_layer(2));
        world.spawn(Body::new("zone", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE).with_layer(5).as_sensor());

        assert_eq!(world.pick(Vec2::ZERO), Some(high));
        assert_eq!(world.hit_test(Vec2::ZERO), Some(1));
        assert!(world.destroy(high));
        assert_eq!(world.pick(Vec2::ZERO), Some(low));
        assert_eq!(world.pick(Vec2::new(3.0, 0.0)), None);
    }

    #[test]
    fn test_move_position_follows_target() {
        let mut world = World::new(WorldTuning::default());
        let id = world.spawn(Body::new("box", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE));
        assert!(world.move_position(id, Vec2::new(0.3, 0.1)));
        world.step(SIM_DT);
        let body = world.body(id).unwrap();
        assert_eq!(body.pos, Vec2::new(0.3, 0.1));
        assert_eq!(body.vel, Vec2::ZERO);
        assert!(body.move_target.is_none());
    }

    #[test]
    fn test_off_center_impulse_spins() {
        let mut world = World::new(WorldTuning::default());
        let id = world.spawn(Body::new("box", BodyKind::Dynamic, Vec2::ZERO, Vec2::splat(0.5)).with_mass(2.0));
        // Push right at the top edge: clockwise spin (negative)
        assert!(world.apply_impulse_at(id, Vec2::new(4.0, 0.0), Vec2::new(0.0, 0.5)));
        let body = world.body(id).unwrap();
        assert_eq!(body.vel, Vec2::new(2.0, 0.0));
        assert!(body.angular_vel < 0.0);
    }

    #[test]
    fn test_static_ignores_impulses() {
        let mut world = World::new(WorldTuning::default());
        let id = world.spawn(floor());
        assert!(!world.apply_impulse_at(id, Vec2::X, Vec2::ZERO));
        assert!(!world.add_force(id, Vec2::Y));
        assert!(!world.move_position(id, Vec2::ONE));
    }

    #[test]
    fn test_destroy_reports_exit() {
        let mut world = World::new(WorldTuning::default());
        let zone = world.spawn(Body::new("zone", BodyKind::Static, Vec2::ZERO, Vec2::splat(2.0)).as_sensor());
        let id = world.spawn(Body::new("box", BodyKind::Kinematic, Vec2::ZERO, Vec2::splat(0.5)));
        let events = world.step(SIM_DT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Enter);

        assert!(world.destroy(id));
        let events = world.step(SIM_DT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Exit);
        assert_eq!(events[0].other(zone), Some(id));
    }
}
