//! Pun Toss - a drag-and-throw physics puzzle
//!
//! Core modules:
//! - `sim`: Physics boundary (`PhysicsWorld`) and a deterministic reference world
//! - `interaction`: Drag-and-throw interaction manager
//! - `gag`: Parameterized pun trigger state machine
//! - `relay`: Contact/release/click signal routing between bodies and listeners
//! - `gimmick`: Buoyancy, ballast and speed limits
//! - `director`: Pun display gating and scoring
//! - `stage`: Fixed-step orchestration of all of the above
//! - `scene`: Data-driven scene description

pub mod director;
pub mod gag;
pub mod gimmick;
pub mod interaction;
pub mod platform;
pub mod relay;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod stage;
pub mod timers;

pub use director::{Cue, Presenter};
pub use scene::SceneSpec;
pub use settings::Settings;
pub use stage::{FixedClock, Stage, StageInput, StagePhase};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default gravity (units/s², negative is down)
    pub const GRAVITY: f32 = -9.81;

    /// Default post-fire wait before a gag's object fades out
    pub const DEFAULT_FADE_INTERVAL: f32 = 1.0;
    /// Default fade-out duration
    pub const DEFAULT_FADE_DURATION: f32 = 0.3;
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_degrees(mut angle: f32) -> f32 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Unsigned distance in degrees between an angle and upright (0°), in [0, 180]
#[inline]
pub fn tilt_from_upright(angle_deg: f32) -> f32 {
    normalize_degrees(angle_deg).abs()
}

/// Z component of the 2D cross product (`a.x * b.y - a.y * b.x`)
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-270.0), 90.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_tilt_from_upright() {
        assert_eq!(tilt_from_upright(350.0), 10.0);
        assert_eq!(tilt_from_upright(90.0), 90.0);
        assert_eq!(tilt_from_upright(-100.0), 100.0);
    }

    #[test]
    fn test_cross() {
        assert_eq!(cross(Vec2::X, Vec2::Y), 1.0);
        assert_eq!(cross(Vec2::Y, Vec2::X), -1.0);
    }
}
