//! Physical helpers that are not gags themselves
//!
//! - `Buoyancy`: upward force while a body is in water
//! - `Ballast`: a weight dropped on a bag is absorbed into the bag's mass
//! - `SpeedLimiter`: caps speeds and keeps a body inside the visible area

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::relay::{ContactNotice, Signal};
use crate::sim::{BodyId, ContactPhase, PhysicsWorld};

/// Stable gimmick identifier (index in the stage)
pub type GimmickId = u32;

/// Axis-aligned visible area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

fn default_max_axis() -> Option<f32> {
    Some(40.0)
}

fn default_max_angular() -> Option<f32> {
    Some(360.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GimmickConfig<B = BodyId> {
    Buoyancy { body: B, water: B, force: f32 },
    Ballast { bag: B, weight: B },
    SpeedLimiter {
        body: B,
        /// Per-axis caps, ignored when `max_linear` is set
        #[serde(default = "default_max_axis")]
        max_x: Option<f32>,
        #[serde(default = "default_max_axis")]
        max_y: Option<f32>,
        #[serde(default)]
        max_linear: Option<f32>,
        /// Degrees per second
        #[serde(default = "default_max_angular")]
        max_angular_deg: Option<f32>,
        #[serde(default)]
        bounds: Option<Bounds>,
    },
}

impl<B> GimmickConfig<B> {
    pub fn speed_limiter(body: B, bounds: Option<Bounds>) -> Self {
        GimmickConfig::SpeedLimiter {
            body,
            max_x: default_max_axis(),
            max_y: default_max_axis(),
            max_linear: None,
            max_angular_deg: default_max_angular(),
            bounds,
        }
    }

    pub fn try_map<C, E>(self, mut f: impl FnMut(B) -> Result<C, E>) -> Result<GimmickConfig<C>, E> {
        Ok(match self {
            GimmickConfig::Buoyancy { body, water, force } => GimmickConfig::Buoyancy {
                body: f(body)?,
                water: f(water)?,
                force,
            },
            GimmickConfig::Ballast { bag, weight } => GimmickConfig::Ballast {
                bag: f(bag)?,
                weight: f(weight)?,
            },
            GimmickConfig::SpeedLimiter {
                body,
                max_x,
                max_y,
                max_linear,
                max_angular_deg,
                bounds,
            } => GimmickConfig::SpeedLimiter {
                body: f(body)?,
                max_x,
                max_y,
                max_linear,
                max_angular_deg,
                bounds,
            },
        })
    }
}

/// Reported back to the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GimmickEvent {
    /// `weight` was merged into `bag` and removed from the world
    Absorbed { bag: BodyId, weight: BodyId },
}

#[derive(Debug, Clone)]
pub struct Gimmick {
    pub id: GimmickId,
    pub config: GimmickConfig,
    /// Buoyancy: water contacts currently held
    in_water: BTreeSet<BodyId>,
    /// Ballast: already absorbed
    spent: bool,
}

impl Gimmick {
    pub fn new(id: GimmickId, config: GimmickConfig) -> Self {
        Self {
            id,
            config,
            in_water: BTreeSet::new(),
            spent: false,
        }
    }

    pub fn subscriptions(&self) -> Vec<(BodyId, Signal)> {
        match self.config {
            GimmickConfig::Buoyancy { water, .. } => vec![(water, Signal::Contact)],
            _ => Vec::new(),
        }
    }

    pub fn is_in_water(&self) -> bool {
        !self.in_water.is_empty()
    }

    pub fn on_contact(&mut self, notice: ContactNotice) {
        if let GimmickConfig::Buoyancy { body, water, .. } = self.config
            && notice.zone == water
            && notice.other == body
        {
            match notice.phase {
                ContactPhase::Enter | ContactPhase::Stay => {
                    self.in_water.insert(water);
                }
                ContactPhase::Exit => {
                    self.in_water.remove(&water);
                }
            }
        }
    }

    /// Forces for the coming physics step
    pub fn pre_step(&self, world: &mut impl PhysicsWorld) {
        if let GimmickConfig::Buoyancy { body, force, .. } = self.config
            && self.is_in_water()
        {
            world.add_force(body, Vec2::new(0.0, force));
        }
    }

    /// Corrections after the physics step
    pub fn post_step(&mut self, world: &mut impl PhysicsWorld) -> Option<GimmickEvent> {
        match self.config {
            GimmickConfig::Ballast { bag, weight } => {
                if self.spent || !world.overlaps(bag, weight) {
                    return None;
                }
                let bag_mass = world.body(bag)?.mass;
                let weight_mass = world.body(weight)?.mass;
                world.set_mass(bag, bag_mass + weight_mass);
                world.destroy(weight);
                self.spent = true;
                log::info!("Bag {bag} absorbed weight {weight} (mass {})", bag_mass + weight_mass);
                Some(GimmickEvent::Absorbed { bag, weight })
            }
            GimmickConfig::SpeedLimiter {
                body,
                max_x,
                max_y,
                max_linear,
                max_angular_deg,
                bounds,
            } => {
                let current = world.body(body)?;
                let (mut pos, mut vel) = (current.pos, current.vel);
                let mut angular_vel = current.angular_vel;

                vel = limit_linear(vel, max_x, max_y, max_linear);
                if let Some(max_deg) = max_angular_deg.filter(|m| *m > 0.0) {
                    let max = max_deg.to_radians();
                    angular_vel = angular_vel.clamp(-max, max);
                }
                if let Some(bounds) = bounds {
                    (pos, vel) = bounce(pos, vel, bounds);
                }

                world.set_velocity(body, vel, angular_vel);
                world.set_position(body, pos);
                None
            }
            GimmickConfig::Buoyancy { .. } => None,
        }
    }
}

/// Clamp overall speed if `max_linear` is set, else each axis separately.
/// Non-positive caps mean unlimited.
pub fn limit_linear(vel: Vec2, max_x: Option<f32>, max_y: Option<f32>, max_linear: Option<f32>) -> Vec2 {
    let positive = |cap: Option<f32>| cap.filter(|c| *c > 0.0);
    if let Some(max) = positive(max_linear) {
        return vel.clamp_length_max(max);
    }
    let mut vel = vel;
    if let Some(max) = positive(max_x) {
        vel.x = vel.x.clamp(-max, max);
    }
    if let Some(max) = positive(max_y) {
        vel.y = vel.y.clamp(-max, max);
    }
    vel
}

/// Reflect the velocity off any edge the body is leaving through
pub fn bounce(mut pos: Vec2, mut vel: Vec2, bounds: Bounds) -> (Vec2, Vec2) {
    if pos.x <= bounds.min.x && vel.x < 0.0 {
        vel.x = -vel.x;
        pos.x = bounds.min.x;
    } else if pos.x >= bounds.max.x && vel.x > 0.0 {
        vel.x = -vel.x;
        pos.x = bounds.max.x;
    }
    if pos.y <= bounds.min.y && vel.y < 0.0 {
        vel.y = -vel.y;
        pos.y = bounds.min.y;
    } else if pos.y >= bounds.max.y && vel.y > 0.0 {
        vel.y = -vel.y;
        pos.y = bounds.max.y;
    }
    (pos, vel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{Body, BodyKind, World, WorldTuning};

    #[test]
    fn test_limit_per_axis() {
        let vel = limit_linear(Vec2::new(55.0, -70.0), Some(40.0), Some(40.0), None);
        assert_eq!(vel, Vec2::new(40.0, -40.0));

        let unlimited = limit_linear(Vec2::new(55.0, -70.0), Some(0.0), None, None);
        assert_eq!(unlimited, Vec2::new(55.0, -70.0));
    }

    #[test]
    fn test_linear_cap_overrides_axes() {
        let vel = limit_linear(Vec2::new(30.0, 40.0), Some(1.0), Some(1.0), Some(10.0));
        assert!((vel.length() - 10.0).abs() < 1e-4);
        assert!((vel.x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounce_off_edges() {
        let bounds = Bounds {
            min: Vec2::new(-10.0, -5.0),
            max: Vec2::new(10.0, 5.0),
        };

        let (pos, vel) = bounce(Vec2::new(-10.5, 6.0), Vec2::new(-3.0, 2.0), bounds);
        assert_eq!(pos, Vec2::new(-10.0, 5.0));
        assert_eq!(vel, Vec2::new(3.0, -2.0));

        // Already heading back in: untouched
        let (pos, vel) = bounce(Vec2::new(-10.5, 0.0), Vec2::new(1.0, 0.0), bounds);
        assert_eq!(pos, Vec2::new(-10.5, 0.0));
        assert_eq!(vel, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_speed_limiter_clamps_spin() {
        let mut world = World::new(WorldTuning::default());
        let id = world.spawn(Body::new("futon", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE));
        world.set_velocity(id, Vec2::new(100.0, 0.0), 20.0);

        let mut limiter = Gimmick::new(0, GimmickConfig::speed_limiter(id, None));
        assert!(limiter.post_step(&mut world).is_none());
        let body = world.body(id).unwrap();
        assert_eq!(body.vel, Vec2::new(40.0, 0.0));
        assert!((body.angular_vel - 360f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_buoyancy_only_in_water() {
        let mut world = World::new(WorldTuning {
            gravity: Vec2::ZERO,
            ..Default::default()
        });
        let bag = world.spawn(Body::new("bag", BodyKind::Dynamic, Vec2::ZERO, Vec2::splat(0.5)));
        let water = world.spawn(Body::new("water", BodyKind::Static, Vec2::ZERO, Vec2::splat(3.0)).as_sensor());
        let mut gimmick = Gimmick::new(
            0,
            GimmickConfig::Buoyancy {
                body: bag,
                water,
                force: 5.0,
            },
        );
        assert_eq!(gimmick.subscriptions(), vec![(water, Signal::Contact)]);

        gimmick.pre_step(&mut world);
        world.step(SIM_DT);
        assert_eq!(world.body(bag).unwrap().vel, Vec2::ZERO);

        gimmick.on_contact(ContactNotice {
            phase: ContactPhase::Enter,
            zone: water,
            other: bag,
        });
        assert!(gimmick.is_in_water());
        gimmick.pre_step(&mut world);
        world.step(SIM_DT);
        assert!(world.body(bag).unwrap().vel.y > 0.0);

        gimmick.on_contact(ContactNotice {
            phase: ContactPhase::Exit,
            zone: water,
            other: bag,
        });
        assert!(!gimmick.is_in_water());
    }

    #[test]
    fn test_ballast_absorbs_once() {
        let mut world = World::new(WorldTuning::default());
        let bag = world.spawn(Body::new("bag", BodyKind::Dynamic, Vec2::ZERO, Vec2::ONE).with_mass(2.0));
        let weight = world.spawn(Body::new("weight", BodyKind::Dynamic, Vec2::new(5.0, 0.0), Vec2::splat(0.5)).with_mass(3.0));
        let mut ballast = Gimmick::new(0, GimmickConfig::Ballast { bag, weight });

        assert!(ballast.post_step(&mut world).is_none());
        world.set_position(weight, Vec2::new(0.5, 0.5));
        assert_eq!(
            ballast.post_step(&mut world),
            Some(GimmickEvent::Absorbed { bag, weight })
        );
        assert_eq!(world.body(bag).unwrap().mass, 5.0);
        assert!(!world.exists(weight));
        assert!(ballast.post_step(&mut world).is_none());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{ "kind": "speed_limiter", "body": "futon" }"#;
        let config: GimmickConfig<String> = serde_json::from_str(json).unwrap();
        assert_eq!(config, GimmickConfig::speed_limiter("futon".to_string(), None));
    }
}
