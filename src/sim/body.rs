//! Rigid body data
//!
//! Bodies are axis-aligned boxes for collision purposes; `rotation` is tracked
//! for gameplay (tilt and angle gags) but does not affect the collision shape.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::aabb_contains;
use crate::normalize_degrees;

/// Stable body identifier (allocated by the world, never reused)
pub type BodyId = u32;

/// How the physics step treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Simulated: gravity, forces, impulses, collisions
    #[default]
    Dynamic,
    /// Moves by its own velocity only
    Kinematic,
    /// Never moves
    Static,
}

/// A body in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    /// Scene name, used to wire gags to bodies
    pub name: String,
    pub kind: BodyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation in radians (counter-clockwise)
    pub rotation: f32,
    /// Angular velocity in radians/sec
    pub angular_vel: f32,
    pub mass: f32,
    pub half_extents: Vec2,
    /// Sensors report contacts but never collide
    #[serde(default)]
    pub sensor: bool,
    #[serde(default)]
    pub tag: Option<String>,
    /// Draw order; higher layers are picked first
    #[serde(default)]
    pub layer: i32,
    /// Continuous force accumulated for the next step
    #[serde(skip)]
    pub force: Vec2,
    /// Pending pointer-driven move, consumed by the next step
    #[serde(skip)]
    pub move_target: Option<Vec2>,
}

impl Body {
    pub fn new(name: impl Into<String>, kind: BodyKind, pos: Vec2, half_extents: Vec2) -> Self {
        Self {
            id: 0,
            name: name.into(),
            kind,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            angular_vel: 0.0,
            mass: 1.0,
            half_extents,
            sensor: false,
            tag: None,
            layer: 0,
            force: Vec2::ZERO,
            move_target: None,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_rotation_degrees(mut self, degrees: f32) -> Self {
        self.rotation = degrees.to_radians();
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// Moment of inertia of a solid box about its center
    pub fn inertia(&self) -> f32 {
        let size = self.half_extents * 2.0;
        self.mass * (size.x * size.x + size.y * size.y) / 12.0
    }

    /// Rotation in degrees, normalized to (-180, 180]
    pub fn rotation_degrees(&self) -> f32 {
        normalize_degrees(self.rotation.to_degrees())
    }

    pub fn contains(&self, point: Vec2) -> bool {
        aabb_contains(self.pos, self.half_extents, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inertia_of_unit_box() {
        let body = Body::new("crate", BodyKind::Dynamic, Vec2::ZERO, Vec2::splat(0.5)).with_mass(6.0);
        // m * (w² + h²) / 12 = 6 * 2 / 12
        assert!((body.inertia() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_degrees_normalized() {
        let body = Body::new("needle", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE)
            .with_rotation_degrees(260.0);
        assert!((body.rotation_degrees() - -100.0).abs() < 1e-3);
    }

    #[test]
    fn test_contains() {
        let body = Body::new("box", BodyKind::Static, Vec2::new(2.0, 2.0), Vec2::ONE);
        assert!(body.contains(Vec2::new(2.5, 1.5)));
        assert!(!body.contains(Vec2::new(3.5, 2.0)));
    }
}
