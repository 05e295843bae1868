//! Collision detection and response for axis-aligned boxes
//!
//! Only dynamic-vs-static pairs are resolved. Everything else is reported as a
//! contact and left to gameplay.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal pointing from the obstacle toward the moving box
    pub normal: Vec2,
    /// Penetration depth along `normal` (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Whether `point` lies inside the box (edges inclusive)
#[inline]
pub fn aabb_contains(center: Vec2, half: Vec2, point: Vec2) -> bool {
    let d = (point - center).abs();
    d.x <= half.x && d.y <= half.y
}

/// Whether two boxes overlap (touching edges count)
#[inline]
pub fn aabb_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> bool {
    let d = (a_pos - b_pos).abs();
    d.x <= a_half.x + b_half.x && d.y <= a_half.y + b_half.y
}

/// Minimum translation to push box A out of box B
///
/// The separating axis with the smallest overlap wins; ties go to the y axis
/// so resting bodies settle vertically.
pub fn aabb_collision(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> CollisionResult {
    let d = a_pos - b_pos;
    let overlap_x = a_half.x + b_half.x - d.x.abs();
    let overlap_y = a_half.y + b_half.y - d.y.abs();

    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return CollisionResult::miss();
    }

    if overlap_y <= overlap_x {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, d.y.signum()),
            penetration: overlap_y,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(d.x.signum(), 0.0),
            penetration: overlap_x,
        }
    }
}

/// Reflect the approaching part of `vel` off a surface
///
/// `restitution` scales the bounce, `friction` bleeds the tangential component.
/// Velocities already separating are returned unchanged.
pub fn resolve_velocity(vel: Vec2, normal: Vec2, restitution: f32, friction: f32) -> Vec2 {
    let approach = vel.dot(normal);
    if approach >= 0.0 {
        return vel;
    }
    let normal_part = normal * approach;
    let tangent_part = vel - normal_part;
    tangent_part * (1.0 - friction).clamp(0.0, 1.0) - normal_part * restitution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_contains_edges() {
        assert!(aabb_contains(Vec2::ZERO, Vec2::ONE, Vec2::new(1.0, -1.0)));
        assert!(!aabb_contains(Vec2::ZERO, Vec2::ONE, Vec2::new(1.01, 0.0)));
    }

    #[test]
    fn test_collision_resting_on_floor() {
        // Box sitting slightly inside a wide floor
        let floor_pos = Vec2::new(0.0, -1.0);
        let floor_half = Vec2::new(10.0, 1.0);
        let result = aabb_collision(Vec2::new(0.0, 0.45), Vec2::splat(0.5), floor_pos, floor_half);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::Y);
        assert!((result.penetration - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_collision_side_wall() {
        let result = aabb_collision(Vec2::new(-0.9, 0.0), Vec2::splat(0.5), Vec2::ZERO, Vec2::new(0.5, 5.0));
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_collision_miss() {
        let result = aabb_collision(Vec2::new(3.0, 0.0), Vec2::ONE, Vec2::ZERO, Vec2::ONE);
        assert!(!result.hit);
    }

    #[test]
    fn test_resolve_velocity_bounce() {
        let vel = Vec2::new(2.0, -10.0);
        let out = resolve_velocity(vel, Vec2::Y, 0.5, 0.0);
        assert!((out.x - 2.0).abs() < 1e-5);
        assert!((out.y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_resolve_velocity_separating_untouched() {
        let vel = Vec2::new(1.0, 3.0);
        assert_eq!(resolve_velocity(vel, Vec2::Y, 0.5, 0.5), vel);
    }
}
